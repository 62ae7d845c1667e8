//! API 路由模块 (JSON)
//!
//! 响应统一使用 `ApiResponse { code, message, data }` 包装。
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录、登出、会话
//! - [`menus`] - 菜单板、详情、增改删
//! - [`waitlist`] - 候位登记与队列
//! - [`events`] - 总线事件推送 (SSE)

pub mod auth;
pub mod events;
pub mod health;
pub mod menus;
pub mod waitlist;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppResult};
