//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::client::ConfirmRequest;
use shared::message::Table;
use shared::models::{MenuCategory, MenuFormData, MenuItem};

use crate::admin::AdminPanel;
use crate::auth::{AdminSession, Session};
use crate::core::ServerState;
use crate::menu::{LoadStatus, MenuCardView, MenuDetailView};
use crate::utils::{ApiResponse, AppError, AppResult, ok};

#[derive(Debug, Serialize)]
pub struct BoardSection {
    pub category: MenuCategory,
    pub items: Vec<MenuCardView>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub status: LoadStatus,
    /// 菜单表变更版本号
    pub version: u64,
    pub sections: Vec<BoardSection>,
}

/// GET /api/menus - 菜单板，只含非空分区
pub async fn list(
    State(state): State<ServerState>,
    session: Session,
) -> Json<ApiResponse<BoardResponse>> {
    let snapshot = state.repository.snapshot();
    let is_admin = session.is_authenticated();

    let sections = snapshot
        .board
        .sections()
        .map(|(category, items)| BoardSection {
            category,
            items: items
                .iter()
                .map(|item| MenuCardView::new(item, is_admin))
                .collect(),
        })
        .collect();

    ok(BoardResponse {
        status: snapshot.status.clone(),
        version: state.resource_versions.get(Table::Menus.as_str()),
        sections,
    })
}

/// GET /api/menus/{id} - 详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<MenuDetailView>>> {
    let snapshot = state.repository.snapshot();
    MenuDetailView::from_selection(snapshot.board.find(&id))
        .map(ok)
        .ok_or_else(|| AppError::menu_not_found(id))
}

/// POST /api/menus - 新建
pub async fn create(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
    Json(form): Json<MenuFormData>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = AdminPanel::new(&state).save(&user, None, &form).await?;
    Ok(ok(item))
}

/// PUT /api/menus/{id} - 整行覆盖
pub async fn update(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
    Path(id): Path<String>,
    Json(form): Json<MenuFormData>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = AdminPanel::new(&state).save(&user, Some(&id), &form).await?;
    Ok(ok(item))
}

/// DELETE /api/menus/{id} - 需要 `{"confirm": true}`
pub async fn delete(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
    Path(id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    AdminPanel::new(&state).delete(&user, &id, req.confirm).await?;
    Ok(Json(ApiResponse::ok()))
}
