//! HTML 页面
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | / | GET | 菜单板 + 对话框 (`?category=&item=&dialog=`) |
//! | /admin/login | POST | 登录，写入会话 cookie |
//! | /admin/logout | POST | 登出，清除 cookie |
//! | /admin/menus | POST | 新建菜单 |
//! | /admin/menus/{id} | POST | 修改菜单 |
//! | /admin/menus/{id}/delete | POST | 删除 (`confirm=true`) |
//! | /waitlist | POST | 候位登记 |
//! | /admin/waitlist/{id}/complete | POST | 完成 (`confirm=true`) |
//! | /admin/waitlist/{id}/delete | POST | 删除 (`confirm=true`) |

mod handler;
pub mod html;
pub mod view;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub use handler::PageQuery;
pub use view::{Dialog, PageView};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::index))
        .route("/admin/login", post(handler::login))
        .route("/admin/logout", post(handler::logout))
        .route("/admin/menus", post(handler::create_menu))
        .route("/admin/menus/{id}", post(handler::update_menu))
        .route("/admin/menus/{id}/delete", post(handler::delete_menu))
        .route("/waitlist", post(handler::join_waitlist))
        .route(
            "/admin/waitlist/{id}/complete",
            post(handler::complete_waitlist),
        )
        .route("/admin/waitlist/{id}/delete", post(handler::delete_waitlist))
}
