use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use menu_client::{ClientConfig, DataClient, MemoryBackend, MemoryConfig, RestClient};
use shared::message::Table;
use tokio::task::JoinHandle;

use crate::auth::JwtService;
use crate::core::Config;
use crate::core::config::BackendMode;
use crate::menu::MenuRepository;
use crate::message::MessageBus;
use crate::utils::{AppError, AppResult};

/// 首次加载的退避基数 (第 n 次失败后等待 n 倍)
const INITIAL_LOAD_BACKOFF: Duration = Duration::from_millis(500);

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每收到一次表变更通知递增一次，`/health` 和菜单接口会带上版本号。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }

    /// 全部版本号 (按资源名排序)
    pub fn all(&self) -> BTreeMap<String, u64> {
        self.versions
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆一份。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | client | Arc<dyn DataClient> | 数据客户端 (托管后端或进程内) |
/// | repository | Arc<MenuRepository> | 菜单快照 |
/// | jwt_service | Arc<JwtService> | 令牌校验 |
/// | message_bus | MessageBus | 进程内消息总线 |
/// | resource_versions | Arc<ResourceVersions> | 表变更版本号 |
/// | realtime | Option<RestClient> | 需要启动 realtime 订阅的客户端 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub client: Arc<dyn DataClient>,
    pub repository: Arc<MenuRepository>,
    pub jwt_service: Arc<JwtService>,
    pub message_bus: MessageBus,
    pub resource_versions: Arc<ResourceVersions>,
    realtime: Option<RestClient>,
    pub started_at: DateTime<Utc>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("backend_mode", &self.config.backend_mode)
            .field("repository", &self.repository)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 按配置构建数据客户端并完成菜单首次加载
    ///
    /// 首次加载失败不会阻止启动，页面显示加载失败提示。
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let (client, realtime): (Arc<dyn DataClient>, Option<RestClient>) =
            match config.backend_mode {
                BackendMode::Rest => {
                    let client_config =
                        ClientConfig::new(&config.backend_url, &config.backend_anon_key)
                            .with_timeout(config.request_timeout());
                    let rest = RestClient::new(client_config).map_err(AppError::from)?;
                    let realtime = config.realtime_enabled.then(|| rest.clone());
                    (Arc::new(rest), realtime)
                }
                BackendMode::Memory => (Arc::new(Self::memory_backend(config)?), None),
            };

        tracing::info!(
            mode = %config.backend_mode,
            url = %config.backend_url,
            "Data client ready"
        );

        let mut state = Self::with_client(config.clone(), client);
        state.realtime = realtime;

        state
            .repository
            .initial_load(config.initial_load_retries, INITIAL_LOAD_BACKOFF)
            .await;

        Ok(state)
    }

    /// demo 模式: 进程内后端，配置了密码时创建管理员账号
    fn memory_backend(config: &Config) -> AppResult<MemoryBackend> {
        let mut memory_config = MemoryConfig::new(&config.jwt.secret);
        memory_config.audience = config.jwt.audience.clone();
        let backend = MemoryBackend::new(memory_config);

        match &config.admin_password {
            Some(password) => {
                backend
                    .add_admin(&config.admin_email, password)
                    .map_err(AppError::from)?;
                tracing::info!(email = %config.admin_email, "In-process admin account created");
            }
            None => tracing::warn!("ADMIN_PASSWORD not set, admin login is unavailable"),
        }
        Ok(backend)
    }

    /// 使用现成的数据客户端构建状态 (测试注入 MemoryBackend)
    pub fn with_client(config: Config, client: Arc<dyn DataClient>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let repository = Arc::new(MenuRepository::new(client.clone()));

        Self {
            config,
            client,
            repository,
            jwt_service,
            message_bus: MessageBus::new(),
            resource_versions: Arc::new(ResourceVersions::new()),
            realtime: None,
            started_at: Utc::now(),
        }
    }

    /// 启动后台任务
    ///
    /// - 菜单仓库监听 (变更通知 → 重拉)
    /// - realtime 订阅 (rest 模式且启用时)
    ///
    /// 任务都在 `message_bus` 的关闭令牌取消后退出。
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = vec![
            self.repository
                .spawn_listener(self.message_bus.clone(), self.resource_versions.clone()),
        ];

        if let Some(rest) = &self.realtime {
            let feed = rest.realtime_feed(
                vec![Table::Menus, Table::Waitlist],
                self.message_bus.shutdown_token().clone(),
            );
            tasks.push(tokio::spawn(feed.run()));
        }

        tracing::info!(count = tasks.len(), "Background tasks started");
        tasks
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取消息总线
    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }
}
