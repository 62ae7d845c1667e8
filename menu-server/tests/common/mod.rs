//! 集成测试公共设施: 进程内后端 + 完整路由
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use menu_client::{MemoryBackend, MemoryConfig};
use menu_server::auth::JwtConfig;
use menu_server::core::{BackendMode, Config};
use menu_server::services::build_router;
use menu_server::ServerState;
use serde_json::Value;
use shared::models::{MenuCategory, MenuItem, WaitlistEntry};
use tower::ServiceExt;
use urlencoding::encode;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_EMAIL: &str = "admin@menu.kr";
pub const ADMIN_PASSWORD: &str = "pw-123456";

pub struct TestApp {
    pub router: Router,
    pub state: ServerState,
    pub backend: Arc<MemoryBackend>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl TestApp {
    /// 已完成首次加载的应用
    pub async fn new(menus: Vec<MenuItem>) -> Self {
        let app = Self::unloaded(menus);
        app.state.repository.refresh().await.unwrap();
        app
    }

    /// 未加载菜单的应用
    pub fn unloaded(menus: Vec<MenuItem>) -> Self {
        let mut config = Config::with_overrides(0, BackendMode::Memory);
        config.jwt = JwtConfig::new(SECRET);

        let backend = Arc::new(MemoryBackend::new(MemoryConfig::new(SECRET)));
        backend.add_admin(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap();
        backend.seed_menus(menus);

        let state = ServerState::with_client(config, backend.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            backend,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// 通过页面登录，返回 `Cookie` 头的值
    pub async fn login_cookie(&self) -> String {
        let response = self
            .post_form(
                "/admin/login",
                &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        let set_cookie = response
            .headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    /// 通过 JSON API 登录，返回 access token
    pub async fn login_token(&self) -> String {
        let response = self
            .json(
                Method::POST,
                "/api/auth/login",
                Some(serde_json::json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()["data"]["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn menu_item(
    id: &str,
    category: MenuCategory,
    name: &str,
    price: i64,
    sort_order: i32,
) -> MenuItem {
    MenuItem {
        id: id.into(),
        category,
        name: name.into(),
        description: String::new(),
        price,
        tags: Vec::new(),
        allergens: Vec::new(),
        origin: String::new(),
        media_url: None,
        sort_order,
        is_soldout: false,
        updated_at: Utc::now(),
    }
}

pub fn waitlist_entry(id: &str, name: &str, minutes_ago: i64) -> WaitlistEntry {
    let created_at: DateTime<Utc> = Utc::now() - Duration::minutes(minutes_ago);
    WaitlistEntry {
        id: id.into(),
        customer_name: name.into(),
        people_count: 2,
        created_at,
        completed_at: None,
    }
}
