//! Waitlist API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/waitlist | POST | 登记 | 无 |
//! | /api/waitlist | GET | 未完成队列 (带序号) | 管理员 |
//! | /api/waitlist/{id}/complete | POST | 标记完成 (`{confirm:true}`) | 管理员 |
//! | /api/waitlist/{id} | DELETE | 删除 (`{confirm:true}`) | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/waitlist", waitlist_routes())
}

fn waitlist_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::join))
        .route("/{id}", delete(handler::delete))
        .route("/{id}/complete", post(handler::complete))
}
