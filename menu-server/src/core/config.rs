use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::JwtConfig;
use crate::utils::AppError;

/// 数据后端模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// 托管后端 (PostgREST + GoTrue + realtime)
    #[default]
    Rest,
    /// 进程内后端 (demo / 测试)
    Memory,
}

impl FromStr for BackendMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::config(format!("Unknown BACKEND_MODE: {other}"))),
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str("rest"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | BACKEND_MODE | rest | rest (托管后端) / memory (进程内) |
/// | BACKEND_URL | http://localhost:54321 | 托管后端地址 |
/// | BACKEND_ANON_KEY | (空) | 公开 API key |
/// | JWT_SECRET | debug 构建自动生成 | 认证服务的 HS256 密钥 |
/// | JWT_AUDIENCE | authenticated | 令牌受众 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | (未设置) | 文件日志目录 |
/// | REQUEST_TIMEOUT_MS | 30000 | 后端请求超时(毫秒) |
/// | INITIAL_LOAD_RETRIES | 3 | 菜单首次加载尝试次数 |
/// | REALTIME_ENABLED | true | 是否启动 realtime 订阅 (rest 模式) |
/// | ADMIN_EMAIL | admin@example.com | memory 模式的管理员账号 |
/// | ADMIN_PASSWORD | (未设置) | memory 模式的管理员密码 |
///
/// # 示例
///
/// ```ignore
/// BACKEND_MODE=memory ADMIN_PASSWORD=changeme HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP 服务端口
    pub http_port: u16,
    pub backend_mode: BackendMode,
    /// 托管后端 base URL
    pub backend_url: String,
    pub backend_anon_key: String,
    /// JWT 校验配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 后端请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 首次加载失败时的尝试次数 (至少 1)
    pub initial_load_retries: u32,
    pub realtime_enabled: bool,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            backend_mode: std::env::var("BACKEND_MODE")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:54321".into()),
            backend_anon_key: std::env::var("BACKEND_ANON_KEY").unwrap_or_default(),
            jwt: JwtConfig::from_env(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            initial_load_retries: std::env::var("INITIAL_LOAD_RETRIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            realtime_enabled: std::env::var("REALTIME_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(http_port: u16, backend_mode: BackendMode) -> Self {
        let mut config = Self::from_env();
        config.http_port = http_port;
        config.backend_mode = backend_mode;
        config.realtime_enabled = false;
        config
    }

    /// 启动前检查
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.is_empty() {
            return Err(AppError::config(
                "JWT_SECRET environment variable must be set in production",
            ));
        }
        if self.backend_mode == BackendMode::Rest && self.backend_anon_key.is_empty() {
            tracing::warn!("BACKEND_ANON_KEY is empty, hosted backend will reject requests");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
