//! 管理面板 (登录、登出、菜单增改删)

pub mod panel;

pub use panel::{AdminPanel, DELETE_FAILED_PREFIX, LOGIN_FAILED_PREFIX, SAVE_FAILED_PREFIX};
