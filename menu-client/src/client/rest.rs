// menu-client/src/client/rest.rs
// REST 客户端 - PostgREST 表接口 + GoTrue 认证接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::client::{AuthSession, AuthUser, LoginRequest};
use shared::message::{ChangeEvent, Table};
use shared::models::{MenuFormData, MenuItem, WaitlistCompletion, WaitlistEntry, WaitlistFormData};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::{ChangeHub, DataClient};
use crate::realtime::RealtimeFeed;
use crate::{ClientConfig, ClientError, ClientResult};

/// 后端错误响应 (PostgREST 用 message，GoTrue 用 error_description / msg)
#[derive(Debug, Default, serde::Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl BackendErrorBody {
    fn into_text(self) -> Option<String> {
        self.message
            .or(self.error_description)
            .or(self.msg)
            .or(self.error)
            .filter(|s| !s.trim().is_empty())
    }
}

/// 从错误响应体提取可展示的文本
pub(crate) fn backend_error_text(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .and_then(BackendErrorBody::into_text)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

/// Hosted backend client
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: ClientConfig,
    hub: ChangeHub,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            hub: ChangeHub::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// Realtime feed publishing into this client's change hub
    pub fn realtime_feed(&self, tables: Vec<Table>, shutdown: CancellationToken) -> RealtimeFeed {
        RealtimeFeed::new(self.config.clone(), self.hub.clone(), tables, shutdown)
    }

    /// apikey + Authorization (用户 token 优先，否则 anon key)
    fn request(&self, method: Method, url: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.config.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn table_request(&self, method: Method, table: Table, token: Option<&str>) -> RequestBuilder {
        self.request(method, &self.config.rest_url(table.as_str()), token)
    }

    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let text = backend_error_text(status, &body);
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::debug!(message = %text, "Backend rejected token");
                ClientError::Unauthorized
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            _ => ClientError::api(status.as_u16(), text),
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn handle_empty(response: reqwest::Response) -> ClientResult<()> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    /// `return=representation` 的写操作返回受影响的行
    async fn single_row<T: DeserializeOwned>(
        response: reqwest::Response,
        id: Option<&str>,
    ) -> ClientResult<T> {
        let rows: Vec<T> = Self::handle_response(response).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(row),
            None => match id {
                Some(id) => Err(ClientError::NotFound(id.to_string())),
                None => Err(ClientError::InvalidResponse(
                    "write returned no rows".to_string(),
                )),
            },
        }
    }
}

fn id_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl DataClient for RestClient {
    async fn select_menus(&self) -> ClientResult<Vec<MenuItem>> {
        let response = self
            .table_request(Method::GET, Table::Menus, None)
            .query(&[("select", "*"), ("order", "sort_order.asc")])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert_menu(&self, token: &str, form: &MenuFormData) -> ClientResult<MenuItem> {
        let response = self
            .table_request(Method::POST, Table::Menus, Some(token))
            .header("Prefer", "return=representation")
            .json(form)
            .send()
            .await?;
        Self::single_row(response, None).await
    }

    async fn update_menu(
        &self,
        token: &str,
        id: &str,
        form: &MenuFormData,
    ) -> ClientResult<MenuItem> {
        let mut body = serde_json::to_value(form)?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert("updated_at".into(), serde_json::to_value(Utc::now())?);
        }
        let response = self
            .table_request(Method::PATCH, Table::Menus, Some(token))
            .query(&id_filter(id))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        Self::single_row(response, Some(id)).await
    }

    async fn delete_menu(&self, token: &str, id: &str) -> ClientResult<()> {
        let response = self
            .table_request(Method::DELETE, Table::Menus, Some(token))
            .query(&id_filter(id))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Self::single_row::<MenuItem>(response, Some(id)).await?;
        Ok(())
    }

    async fn select_active_waitlist(&self, token: &str) -> ClientResult<Vec<WaitlistEntry>> {
        let response = self
            .table_request(Method::GET, Table::Waitlist, Some(token))
            .query(&[
                ("select", "*"),
                ("completed_at", "is.null"),
                ("order", "created_at.asc"),
            ])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert_waitlist(&self, form: &WaitlistFormData) -> ClientResult<WaitlistEntry> {
        let response = self
            .table_request(Method::POST, Table::Waitlist, None)
            .header("Prefer", "return=representation")
            .json(&form.normalized())
            .send()
            .await?;
        Self::single_row(response, None).await
    }

    async fn complete_waitlist(
        &self,
        token: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> ClientResult<()> {
        let response = self
            .table_request(Method::PATCH, Table::Waitlist, Some(token))
            .query(&[("id", format!("eq.{id}")), ("completed_at", "is.null".to_string())])
            .header("Prefer", "return=minimal")
            .json(&WaitlistCompletion { completed_at: at })
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn delete_waitlist(&self, token: &str, id: &str) -> ClientResult<()> {
        let response = self
            .table_request(Method::DELETE, Table::Waitlist, Some(token))
            .query(&id_filter(id))
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let response = self
            .request(
                Method::POST,
                &self.config.auth_url("token?grant_type=password"),
                None,
            )
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Auth(backend_error_text(status, &body)));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn sign_out(&self, token: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &self.config.auth_url("logout"), Some(token))
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn get_user(&self, token: &str) -> ClientResult<AuthUser> {
        let response = self
            .request(Method::GET, &self.config.auth_url("user"), Some(token))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.hub.subscribe(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_text_prefers_message() {
        let body = r#"{"code":"23505","message":"duplicate key","details":null}"#;
        assert_eq!(
            backend_error_text(StatusCode::CONFLICT, body),
            "duplicate key"
        );
    }

    #[test]
    fn test_backend_error_text_gotrue_shapes() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            backend_error_text(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
        let body = r#"{"code":400,"msg":"Email not confirmed"}"#;
        assert_eq!(
            backend_error_text(StatusCode::BAD_REQUEST, body),
            "Email not confirmed"
        );
    }

    #[test]
    fn test_backend_error_text_fallbacks() {
        assert_eq!(
            backend_error_text(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            backend_error_text(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }
}
