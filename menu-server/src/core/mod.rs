//! 核心模块
//!
//! - [`config`] - 环境变量配置
//! - [`state`] - 共享状态 (数据客户端、菜单仓库、JWT、消息总线)
//! - [`server`] - HTTP 服务器

pub mod config;
pub mod server;
pub mod state;

pub use config::{BackendMode, Config};
pub use server::Server;
pub use state::{ResourceVersions, ServerState};
