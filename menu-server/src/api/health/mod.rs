//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 存活 + 菜单加载状态 | 无 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "backend_mode": "rest",
//!   "menu": { "status": { "state": "ready" }, "items": 12, "generation": 3 },
//!   "versions": { "menus": 2 },
//!   "uptime_seconds": 120
//! }
//! ```

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::ServerState;
use crate::menu::LoadStatus;

/// 健康检查路由 - 公共路由 (无需认证)
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded (菜单加载失败)
    status: &'static str,
    version: &'static str,
    backend_mode: String,
    menu: MenuHealth,
    /// 各表收到的变更通知次数
    versions: BTreeMap<String, u64>,
    uptime_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct MenuHealth {
    status: LoadStatus,
    items: usize,
    generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    loaded_at: Option<DateTime<Utc>>,
}

/// GET /health
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let snapshot = state.repository.snapshot();
    let status = match snapshot.status {
        LoadStatus::Failed(_) => "degraded",
        _ => "ok",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        backend_mode: state.config.backend_mode.to_string(),
        menu: MenuHealth {
            status: snapshot.status.clone(),
            items: snapshot.items.len(),
            generation: snapshot.generation,
            loaded_at: snapshot.loaded_at,
        },
        versions: state.resource_versions.all(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}
