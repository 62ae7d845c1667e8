//! Session Extractor
//!
//! 每个请求从 `Authorization: Bearer` 头或 `sb-access-token` cookie 解析会话。
//! 会话不是全局状态，处理函数通过提取器显式拿到它。

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::client::{AuthClaims, AuthUser};

use crate::AppError;
use crate::auth::{JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 页面登录后写入的 cookie 名
pub const SESSION_COOKIE: &str = "sb-access-token";

/// 已登录的管理员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: String,
    pub email: Option<String>,
    /// 原始 access token，调用后端写接口时透传
    pub token: String,
}

impl AdminUser {
    pub fn from_claims(claims: AuthClaims, token: &str) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            token: token.to_string(),
        }
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: self.email.clone(),
            role: "authenticated".to_string(),
        }
    }
}

/// 请求会话: 匿名或已登录
///
/// 无效/过期的令牌按匿名处理 (页面照常渲染)，需要管理员的接口用 [`AdminSession`]。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(AdminUser),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&AdminUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }

    /// 解析会话；有令牌但校验失败时返回错误
    fn resolve(parts: &Parts, jwt_service: &JwtService) -> Result<Self, AppError> {
        let Some(token) = request_token(parts) else {
            return Ok(Self::Anonymous);
        };

        match jwt_service.validate_token(token) {
            Ok(claims) => Ok(Self::Authenticated(AdminUser::from_claims(claims, token))),
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );

                match e {
                    JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}

/// Bearer 头优先，其次 cookie
fn request_token(parts: &Parts) -> Option<&str> {
    if let Some(token) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_from_header)
    {
        return Some(token);
    }

    parts
        .headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, SESSION_COOKIE))
}

/// 从 `Cookie` 头取指定名字的值
pub fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let session = Session::resolve(parts, &state.get_jwt_service()).unwrap_or_default();
        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

/// 管理员会话提取器，匿名请求返回 401
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminUser);

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match Session::resolve(parts, &state.get_jwt_service())? {
            Session::Authenticated(user) => Ok(AdminSession(user)),
            Session::Anonymous => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                Err(AppError::not_authenticated())
            }
        }
    }
}
