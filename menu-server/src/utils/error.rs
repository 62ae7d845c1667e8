//! 统一错误处理
//!
//! 错误类型来自 `shared::error`，后端错误经 `From<ClientError>` 转换。
//! 本模块补充按资源细化 "未找到" 的辅助函数和页面提示文案。

use axum::Json;
use menu_client::ClientError;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// 成功响应
pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// 菜单操作的后端错误 (未找到 → `MenuNotFound`)
pub fn menu_error(id: &str) -> impl FnOnce(ClientError) -> AppError + '_ {
    move |err| {
        if err.is_not_found() {
            AppError::menu_not_found(id)
        } else {
            AppError::from(err)
        }
    }
}

/// 候位操作的后端错误 (未找到 → `WaitlistEntryNotFound`)
pub fn waitlist_error(id: &str) -> impl FnOnce(ClientError) -> AppError + '_ {
    move |err| {
        if err.is_not_found() {
            AppError::waitlist_not_found(id)
        } else {
            AppError::from(err)
        }
    }
}

/// 页面内联提示: 前缀 + 错误原文，例如 `저장 실패: duplicate key value`
pub fn inline_message(prefix: &str, err: &AppError) -> String {
    format!("{prefix}{}", err.message)
}
