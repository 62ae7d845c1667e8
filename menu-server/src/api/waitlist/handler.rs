//! Waitlist API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::client::ConfirmRequest;
use shared::models::{WaitlistEntry, WaitlistFormData};

use crate::auth::AdminSession;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};
use crate::waitlist::{self, JOIN_SUCCESS_MESSAGE, QueueAction, WaitlistManager, WaitlistQueue};

/// POST /api/waitlist - 顾客登记
pub async fn join(
    State(state): State<ServerState>,
    Json(form): Json<WaitlistFormData>,
) -> AppResult<Json<ApiResponse<WaitlistEntry>>> {
    let entry = waitlist::submit(&state.client, &form).await?;
    Ok(Json(ApiResponse::success_with_message(JOIN_SUCCESS_MESSAGE, entry)))
}

/// GET /api/waitlist - 未完成队列
pub async fn list(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
) -> AppResult<Json<ApiResponse<WaitlistQueue>>> {
    let queue = WaitlistManager::new(state.client.clone()).load(&user).await?;
    Ok(ok(queue))
}

/// POST /api/waitlist/{id}/complete - 返回更新后的队列
pub async fn complete(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
    Path(id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<WaitlistQueue>>> {
    let queue = WaitlistManager::new(state.client.clone())
        .apply(&user, QueueAction::Complete, &id, req.confirm)
        .await?;
    Ok(ok(queue))
}

/// DELETE /api/waitlist/{id} - 返回更新后的队列
pub async fn delete(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
    Path(id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<WaitlistQueue>>> {
    let queue = WaitlistManager::new(state.client.clone())
        .apply(&user, QueueAction::Delete, &id, req.confirm)
        .await?;
    Ok(ok(queue))
}
