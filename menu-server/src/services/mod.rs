//! 服务组装
//!
//! - [`http`] - 路由合并、Tower 中间件、访问日志

pub mod http;

pub use self::http::{build_app, build_router};
