//! Menu Client - data client for the hosted backend
//!
//! Provides the [`DataClient`] trait plus:
//! - [`RestClient`]: PostgREST tables + GoTrue auth over HTTP
//! - [`RealtimeFeed`]: websocket change feed
//! - `MemoryBackend` (feature `in-process`): same semantics, in memory

pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "in-process")]
pub mod memory;
pub mod realtime;

pub use client::{ChangeHub, DataClient, RestClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
#[cfg(feature = "in-process")]
pub use memory::{MemoryBackend, MemoryConfig, Operation};
pub use realtime::RealtimeFeed;

/// 安装 rustls 的 ring 加密后端 (websocket TLS 需要)，重复调用无副作用
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
