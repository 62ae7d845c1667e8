//! 认证模块
//!
//! - [`JwtService`] - 认证服务签发令牌的本地校验
//! - [`Session`] / [`AdminSession`] - 请求会话提取器

pub mod jwt;
pub mod session;

pub use jwt::{JwtConfig, JwtError, JwtService};
pub use session::{AdminSession, AdminUser, SESSION_COOKIE, Session, cookie_value};
