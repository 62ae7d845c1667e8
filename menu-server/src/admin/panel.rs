//! 管理面板操作
//!
//! 状态机 `{匿名, 已登录}`: 登录成功后切到已登录，登出清除会话并重拉菜单。
//! 增改删只对已登录会话开放，成功后重拉菜单；失败时返回错误，
//! 调用方保持表单/对话框不变并显示内联提示。

use std::sync::Arc;

use menu_client::DataClient;
use shared::client::AuthSession;
use shared::message::BusMessage;
use shared::models::{MenuFormData, MenuItem};
use shared::validation::validate_credentials;

use crate::auth::{AdminUser, JwtService};
use crate::core::ServerState;
use crate::menu::{MenuRepository, normalize_tokens};
use crate::message::MessageBus;
use crate::security_log;
use crate::utils::{AppError, AppResult, menu_error};

pub const LOGIN_FAILED_PREFIX: &str = "로그인 실패: ";
pub const SAVE_FAILED_PREFIX: &str = "저장 실패: ";
pub const DELETE_FAILED_PREFIX: &str = "삭제 실패: ";

pub struct AdminPanel {
    client: Arc<dyn DataClient>,
    repository: Arc<MenuRepository>,
    jwt_service: Arc<JwtService>,
    bus: MessageBus,
}

impl AdminPanel {
    pub fn new(state: &ServerState) -> Self {
        Self {
            client: state.client.clone(),
            repository: state.repository.clone(),
            jwt_service: state.get_jwt_service(),
            bus: state.message_bus.clone(),
        }
    }

    /// 邮箱密码登录
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::invalid_credentials("이메일과 비밀번호를 입력해주세요."));
        }
        validate_credentials(email, password)?;

        match self.client.sign_in(email, password).await {
            Ok(session) => {
                security_log!("INFO", "login_success", user_id = session.user.id.clone());
                self.bus.publish(BusMessage::auth_state_changed(
                    true,
                    Some(session.user.id.clone()),
                ));
                Ok(session)
            }
            Err(e) => {
                let err = AppError::from(e);
                security_log!(
                    "WARN",
                    "login_failed",
                    email = email.to_string(),
                    reason = err.message.clone()
                );
                Err(err)
            }
        }
    }

    /// 登出
    ///
    /// 令牌先在本地作废，之后不论 cookie 还是 Bearer 头带着它都按匿名处理。
    /// 后端撤销失败只记录日志；总线上的会话变更事件触发菜单重拉
    pub async fn logout(&self, user: &AdminUser) {
        self.jwt_service.revoke(&user.token);
        if let Err(e) = self.client.sign_out(&user.token).await {
            tracing::warn!(user_id = %user.id, "Backend sign-out failed: {}", e);
        }
        security_log!("INFO", "logout", user_id = user.id.clone());
        self.bus.publish(BusMessage::auth_state_changed(false, None));
    }

    /// 新建表单默认值: 分类 대표，sort_order 为当前条目数
    pub fn new_item_form(&self) -> MenuFormData {
        let count = i32::try_from(self.repository.item_count()).unwrap_or(i32::MAX);
        MenuFormData::new_with_sort_order(count)
    }

    /// 保存: `id` 为空时新建，否则整行覆盖
    pub async fn save(
        &self,
        user: &AdminUser,
        id: Option<&str>,
        form: &MenuFormData,
    ) -> AppResult<MenuItem> {
        let form = normalize_tokens(form);
        form.validate()?;

        let saved = match id {
            None => self
                .client
                .insert_menu(&user.token, &form)
                .await
                .map_err(AppError::from)?,
            Some(id) => self
                .client
                .update_menu(&user.token, id, &form)
                .await
                .map_err(menu_error(id))?,
        };

        tracing::info!(
            user_id = %user.id,
            menu_id = %saved.id,
            created = id.is_none(),
            "Menu item saved"
        );
        self.reload().await;
        Ok(saved)
    }

    /// 删除，必须带确认
    pub async fn delete(&self, user: &AdminUser, id: &str, confirmed: bool) -> AppResult<()> {
        if !confirmed {
            return Err(AppError::confirmation_required("delete_menu"));
        }

        self.client
            .delete_menu(&user.token, id)
            .await
            .map_err(menu_error(id))?;

        tracing::info!(user_id = %user.id, menu_id = %id, "Menu item deleted");
        self.reload().await;
        Ok(())
    }

    /// 写入已成功，重拉失败只保留旧快照
    async fn reload(&self) {
        if let Err(e) = self.repository.refresh().await {
            tracing::warn!("Menu refresh after write failed: {}", e);
        }
    }
}
