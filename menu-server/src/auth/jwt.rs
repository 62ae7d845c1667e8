//! JWT 令牌校验
//!
//! 令牌由认证服务 (托管后端或进程内后端) 签发，这里只做本地校验：
//! HS256 签名、受众、过期时间。

use std::sync::Arc;

use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::client::AuthClaims;
use thiserror::Error;

/// 令牌受众默认值 (托管认证服务签发给登录用户的 aud)
pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// 认证服务的签名密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌受众
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// 从环境变量加载
    ///
    /// release 构建缺少 `JWT_SECRET` 时 secret 为空，由 `Config::validate` 拒绝启动
    pub fn from_env() -> Self {
        let secret = load_jwt_secret().unwrap_or_else(|e| {
            tracing::error!("JWT configuration error: {}", e);
            String::new()
        });

        Self {
            secret,
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.into()),
        }
    }
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌已登出")]
    RevokedToken,

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// 生成可打印的安全 JWT 密钥 (用于开发环境)
pub fn generate_secure_printable_jwt_secret() -> Result<String, JwtError> {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_=+.";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    rng.fill(&mut bytes)
        .map_err(|_| JwtError::ConfigError("Failed to generate secure random key".into()))?;

    Ok(bytes
        .iter()
        .map(|b| ALLOWED[*b as usize % ALLOWED.len()] as char)
        .collect())
}

/// 从环境变量安全地加载 JWT 密钥
fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < 32 {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Ok(secret)
        }
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "JWT_SECRET not set! Generating temporary key, hosted tokens will not validate."
                );
                generate_secure_printable_jwt_secret()
            }
            #[cfg(not(debug_assertions))]
            {
                Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production!".to_string(),
                ))
            }
        }
    }
}

/// JWT 令牌校验服务
///
/// 登出的令牌在过期前记在 `revoked` 里 (令牌 → exp)，克隆之间共享
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    decoding_key: DecodingKey,
    revoked: Arc<DashMap<String, i64>>,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("audience", &self.config.audience)
            .field("revoked", &self.revoked.len())
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// 使用指定配置创建 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            decoding_key,
            revoked: Arc::new(DashMap::new()),
        }
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["sub", "exp", "aud"]);

        let token_data =
            decode::<AuthClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                    _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        if self.revoked.contains_key(token) {
            return Err(JwtError::RevokedToken);
        }
        Ok(token_data.claims)
    }

    /// 登出后本地作废令牌，无效或已过期的令牌无需记录
    ///
    /// 顺便清掉已经过期的记录；返回是否新记录了一条
    pub fn revoke(&self, token: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);

        match self.validate_token(token) {
            Ok(claims) => self.revoked.insert(token.to_string(), claims.exp).is_none(),
            Err(_) => false,
        }
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }

    /// 距离过期的剩余秒数
    pub fn expiration_seconds(claims: &AuthClaims) -> i64 {
        (claims.exp - chrono::Utc::now().timestamp()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret-test-secret-test-secret-0123";

    fn token(secret: &str, aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = AuthClaims {
            sub: "u1".into(),
            email: Some("admin@example.com".into()),
            role: Some("authenticated".into()),
            aud: aud.into(),
            exp: now + exp_offset,
            iat: now,
            session_id: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig::new(SECRET))
    }

    #[test]
    fn test_valid_token() {
        let claims = service()
            .validate_token(&token(SECRET, DEFAULT_AUDIENCE, 3600))
            .unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(JwtService::expiration_seconds(&claims) > 3500);
    }

    #[test]
    fn test_expired_token() {
        let err = service()
            .validate_token(&token(SECRET, DEFAULT_AUDIENCE, -3600))
            .unwrap_err();
        assert!(matches!(err, JwtError::ExpiredToken));
    }

    #[test]
    fn test_wrong_secret_and_audience() {
        let err = service()
            .validate_token(&token("another-secret-another-secret-0000", DEFAULT_AUDIENCE, 3600))
            .unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));

        assert!(service().validate_token(&token(SECRET, "anon", 3600)).is_err());
        assert!(service().validate_token("garbage").is_err());
    }

    #[test]
    fn test_revoked_token_is_rejected() {
        let service = service();
        let live = token(SECRET, DEFAULT_AUDIENCE, 3600);

        assert!(service.revoke(&live));
        assert!(!service.revoke(&live));
        let err = service.validate_token(&live).unwrap_err();
        assert!(matches!(err, JwtError::RevokedToken));

        // 克隆共享同一份登出记录
        assert!(service.clone().validate_token(&live).is_err());

        assert!(!service.revoke("garbage"));
        assert!(!service.revoke(&token(SECRET, DEFAULT_AUDIENCE, -3600)));
        assert_eq!(service.revoked.len(), 1);
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_generated_secret_is_printable() {
        let secret = generate_secure_printable_jwt_secret().unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_graphic()));
    }
}
