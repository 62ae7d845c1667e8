//! Client error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
///
/// `Api` / `Auth` 的 Display 只输出后端给出的原文，页面直接拼在
/// "저장 실패: " 之类的前缀后面。
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Sign-in rejected
    #[error("{0}")]
    Auth(String),

    /// Missing / invalid / expired token
    #[error("Authentication required")]
    Unauthorized,

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Realtime channel failure
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Client misconfigured (bad URL, missing key)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// 后端错误 → 应用错误
///
/// 未找到统一映射为 `NotFound`，调用方按资源细化 (菜单/候位)。
/// 其余保留后端原文作为 message。
impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            e if e.is_not_found() => AppError::with_message(ErrorCode::NotFound, e.to_string()),
            ClientError::Auth(message) => AppError::invalid_credentials(message),
            ClientError::Unauthorized => AppError::not_authenticated(),
            e if e.is_timeout() => AppError::timeout(e.to_string()),
            ClientError::Http(e) => AppError::network(e.to_string()),
            ClientError::Config(message) => AppError::config(message),
            e => AppError::backend(e.to_string()),
        }
    }
}
