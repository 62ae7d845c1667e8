//! Menu API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/menus | GET | 菜单板 (按分类分区) | 无 |
//! | /api/menus | POST | 新建 | 管理员 |
//! | /api/menus/{id} | GET | 详情 | 无 |
//! | /api/menus/{id} | PUT | 整行覆盖 | 管理员 |
//! | /api/menus/{id} | DELETE | 删除 (`{confirm:true}`) | 管理员 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menus", menu_routes())
}

fn menu_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
