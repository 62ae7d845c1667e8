//! Authentication Handlers

use axum::{Json, extract::State};
use shared::client::{AuthSession, LoginRequest, SessionInfo};

use crate::admin::AdminPanel;
use crate::auth::{AdminSession, Session};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/auth/login - 邮箱密码登录，返回认证服务签发的会话
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let session = AdminPanel::new(&state).login(&req.email, &req.password).await?;
    Ok(ok(session))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<ServerState>,
    AdminSession(user): AdminSession,
) -> AppResult<Json<ApiResponse<()>>> {
    AdminPanel::new(&state).logout(&user).await;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/auth/session
pub async fn session(session: Session) -> Json<ApiResponse<SessionInfo>> {
    ok(SessionInfo {
        authenticated: session.is_authenticated(),
        user: session.user().map(|u| u.to_auth_user()),
    })
}
