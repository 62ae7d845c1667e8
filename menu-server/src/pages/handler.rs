//! Page Handlers
//!
//! 成功的写操作以 303 跳回首页; 失败时重新渲染同一对话框，回填输入并显示内联提示。

use axum::{
    Form,
    extract::{Path, Query, State},
    http::header,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use urlencoding::encode;

use super::view::{Dialog, PageView};
use crate::admin::{AdminPanel, DELETE_FAILED_PREFIX, LOGIN_FAILED_PREFIX, SAVE_FAILED_PREFIX};
use crate::auth::{AdminUser, SESSION_COOKIE, Session};
use crate::core::ServerState;
use crate::menu::{CategorySelection, MenuDetailView, MenuFormInput};
use crate::utils::{AppError, inline_message};
use crate::waitlist::{
    self, JOIN_FAILED_PREFIX, JOIN_SUCCESS_MESSAGE, LOAD_FAILED_PREFIX, QueueAction,
    WaitlistFormInput, WaitlistManager,
};

/// 未登录时 cookie 的默认有效期 (秒)
const DEFAULT_COOKIE_MAX_AGE: i64 = 3600;
const NOTICE_WAITLIST_JOINED: &str = "waitlist_joined";
const LOGIN_REDIRECT: &str = "/?dialog=login";
const QUEUE_REDIRECT: &str = "/?dialog=queue";

/// 首页查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub category: Option<String>,
    /// 详情面板
    pub item: Option<String>,
    /// login | add | waitlist | queue
    pub dialog: Option<String>,
    pub edit: Option<String>,
    pub confirm_delete: Option<String>,
    pub notice: Option<String>,
    /// complete | delete，配合 `queue_id`
    pub queue_action: Option<String>,
    pub queue_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// 确认表单，隐藏字段 `confirm=true`
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl ConfirmForm {
    fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("true")
    }
}

fn parse_queue_action(action: &str) -> Option<QueueAction> {
    match action {
        "complete" => Some(QueueAction::Complete),
        "delete" => Some(QueueAction::Delete),
        _ => None,
    }
}

/// 渲染首页 (默认分类，无详情)
fn render_page(state: &ServerState, is_admin: bool, dialog: Dialog) -> Html<String> {
    let snapshot = state.repository.snapshot();
    let view = PageView {
        snapshot: &snapshot,
        is_admin,
        selection: CategorySelection::default(),
        detail: None,
        dialog,
        notice: None,
    };
    Html(view.render())
}

fn failure(state: &ServerState, is_admin: bool, err: &AppError, dialog: Dialog) -> Response {
    (err.http_status(), render_page(state, is_admin, dialog)).into_response()
}

fn session_cookie(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// GET /
pub async fn index(
    State(state): State<ServerState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let snapshot = state.repository.snapshot();
    let user = session.user();
    let is_admin = user.is_some();

    let selection = CategorySelection::from_label(query.category.as_deref());
    let detail = query
        .item
        .as_deref()
        .and_then(|id| MenuDetailView::from_selection(snapshot.board.find(id)));

    let dialog = match user {
        Some(user) => admin_dialog(&state, user, &query).await,
        None => visitor_dialog(&query),
    };

    let notice = match query.notice.as_deref() {
        Some(NOTICE_WAITLIST_JOINED) => Some(JOIN_SUCCESS_MESSAGE),
        _ => None,
    };

    let view = PageView {
        snapshot: &snapshot,
        is_admin,
        selection,
        detail,
        dialog,
        notice,
    };
    Html(view.render())
}

fn visitor_dialog(query: &PageQuery) -> Dialog {
    match query.dialog.as_deref() {
        Some("waitlist") => Dialog::Waitlist {
            input: WaitlistFormInput::default(),
            error: None,
        },
        Some("login" | "add" | "queue") => Dialog::Login {
            email: String::new(),
            error: None,
        },
        _ if query.edit.is_some() || query.confirm_delete.is_some() => Dialog::Login {
            email: String::new(),
            error: None,
        },
        _ => Dialog::None,
    }
}

async fn admin_dialog(state: &ServerState, user: &AdminUser, query: &PageQuery) -> Dialog {
    let snapshot = state.repository.snapshot();

    if let Some(id) = query.edit.as_deref() {
        return match snapshot.board.find(id) {
            Some(item) => Dialog::MenuForm {
                edit_id: Some(item.id.clone()),
                input: MenuFormInput::from(item),
                error: None,
            },
            None => Dialog::None,
        };
    }

    if let Some(id) = query.confirm_delete.as_deref() {
        return match snapshot.board.find(id) {
            Some(item) => Dialog::ConfirmDelete {
                id: item.id.clone(),
                name: item.name.clone(),
                error: None,
            },
            None => Dialog::None,
        };
    }

    match query.dialog.as_deref() {
        Some("add") => Dialog::MenuForm {
            edit_id: None,
            input: MenuFormInput::from(&AdminPanel::new(state).new_item_form()),
            error: None,
        },
        Some("waitlist") => Dialog::Waitlist {
            input: WaitlistFormInput::default(),
            error: None,
        },
        Some("queue") => {
            let pending = query
                .queue_action
                .as_deref()
                .and_then(parse_queue_action)
                .zip(query.queue_id.clone());
            queue_dialog(state, user, pending, None).await
        }
        _ => Dialog::None,
    }
}

async fn queue_dialog(
    state: &ServerState,
    user: &AdminUser,
    pending: Option<(QueueAction, String)>,
    error: Option<String>,
) -> Dialog {
    let queue = WaitlistManager::new(state.client.clone())
        .load(user)
        .await
        .map_err(|e| inline_message(LOAD_FAILED_PREFIX, &e));
    Dialog::Queue {
        queue,
        pending,
        error,
    }
}

/// POST /admin/login
pub async fn login(State(state): State<ServerState>, Form(form): Form<LoginForm>) -> Response {
    match AdminPanel::new(&state).login(&form.email, &form.password).await {
        Ok(session) => {
            let max_age = session
                .expires_at
                .map(|at| at - Utc::now().timestamp())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_COOKIE_MAX_AGE);
            let cookie = session_cookie(
                &session.access_token,
                max_age,
                state.config.is_production(),
            );
            (
                AppendHeaders([(header::SET_COOKIE, cookie)]),
                Redirect::to("/"),
            )
                .into_response()
        }
        Err(e) => {
            let dialog = Dialog::Login {
                email: form.email,
                error: Some(inline_message(LOGIN_FAILED_PREFIX, &e)),
            };
            failure(&state, false, &e, dialog)
        }
    }
}

/// POST /admin/logout - 无论后端是否成功都清除 cookie
pub async fn logout(State(state): State<ServerState>, session: Session) -> Response {
    if let Some(user) = session.user() {
        AdminPanel::new(&state).logout(user).await;
    }
    let cookie = session_cookie("", 0, state.config.is_production());
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/"),
    )
        .into_response()
}

/// POST /admin/menus - 新建
pub async fn create_menu(
    State(state): State<ServerState>,
    session: Session,
    Form(input): Form<MenuFormInput>,
) -> Response {
    save_menu(state, session, None, input).await
}

/// POST /admin/menus/{id} - 修改
pub async fn update_menu(
    State(state): State<ServerState>,
    session: Session,
    Path(id): Path<String>,
    Form(input): Form<MenuFormInput>,
) -> Response {
    save_menu(state, session, Some(id), input).await
}

async fn save_menu(
    state: ServerState,
    session: Session,
    id: Option<String>,
    input: MenuFormInput,
) -> Response {
    let Some(user) = session.user() else {
        return Redirect::to(LOGIN_REDIRECT).into_response();
    };

    let result = match input.parse() {
        Ok(form) => AdminPanel::new(&state).save(user, id.as_deref(), &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => Redirect::to(&format!(
            "/?category={}",
            encode(item.category.label())
        ))
        .into_response(),
        Err(e) => {
            let dialog = Dialog::MenuForm {
                edit_id: id,
                error: Some(inline_message(SAVE_FAILED_PREFIX, &e)),
                input,
            };
            failure(&state, true, &e, dialog)
        }
    }
}

/// POST /admin/menus/{id}/delete
pub async fn delete_menu(
    State(state): State<ServerState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    let Some(user) = session.user() else {
        return Redirect::to(LOGIN_REDIRECT).into_response();
    };

    // 失败时对话框仍需显示名称，先从删除前的快照取
    let name = state
        .repository
        .snapshot()
        .board
        .find(&id)
        .map(|item| item.name.clone())
        .unwrap_or_else(|| id.clone());

    match AdminPanel::new(&state).delete(user, &id, form.confirmed()).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            let dialog = Dialog::ConfirmDelete {
                id,
                name,
                error: Some(inline_message(DELETE_FAILED_PREFIX, &e)),
            };
            failure(&state, true, &e, dialog)
        }
    }
}

/// POST /waitlist - 顾客登记
pub async fn join_waitlist(
    State(state): State<ServerState>,
    session: Session,
    Form(input): Form<WaitlistFormInput>,
) -> Response {
    let result = match input.parse() {
        Ok(form) => waitlist::submit(&state.client, &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(entry) => {
            tracing::info!(entry_id = %entry.id, people = entry.people_count, "Waitlist joined");
            Redirect::to(&format!("/?notice={NOTICE_WAITLIST_JOINED}")).into_response()
        }
        Err(e) => {
            let dialog = Dialog::Waitlist {
                input,
                error: Some(inline_message(JOIN_FAILED_PREFIX, &e)),
            };
            failure(&state, session.is_authenticated(), &e, dialog)
        }
    }
}

/// POST /admin/waitlist/{id}/complete
pub async fn complete_waitlist(
    State(state): State<ServerState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    apply_queue_action(state, session, QueueAction::Complete, id, form).await
}

/// POST /admin/waitlist/{id}/delete
pub async fn delete_waitlist(
    State(state): State<ServerState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    apply_queue_action(state, session, QueueAction::Delete, id, form).await
}

async fn apply_queue_action(
    state: ServerState,
    session: Session,
    action: QueueAction,
    id: String,
    form: ConfirmForm,
) -> Response {
    let Some(user) = session.user() else {
        return Redirect::to(LOGIN_REDIRECT).into_response();
    };

    match WaitlistManager::new(state.client.clone())
        .apply(user, action, &id, form.confirmed())
        .await
    {
        Ok(_) => Redirect::to(QUEUE_REDIRECT).into_response(),
        Err(e) => {
            let error = inline_message(action.failure_prefix(), &e);
            let dialog = queue_dialog(&state, user, Some((action, id)), Some(error)).await;
            (e.http_status(), render_page(&state, true, dialog)).into_response()
        }
    }
}
