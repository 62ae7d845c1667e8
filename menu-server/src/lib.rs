//! Menu Server - 餐厅菜单板与候位服务
//!
//! # 架构概述
//!
//! - **数据客户端** (`menu-client`): 托管后端 (REST + realtime) 或进程内 demo 后端
//! - **菜单仓库** (`menu`): 全量快照 + 分类分区，变更通知触发整表重拉
//! - **认证** (`auth`): 后端签发的 JWT 本地校验，`Session` 提取器
//! - **管理面板** (`admin`): 登录/登出、菜单增改删
//! - **候位** (`waitlist`): 顾客登记表单、管理员队列
//! - **页面** (`pages`): 服务端渲染的单页视图
//! - **HTTP API** (`api`): JSON 接口
//!
//! # 模块结构
//!
//! ```text
//! menu-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 校验、会话提取器
//! ├── message/       # 进程内消息总线
//! ├── menu/          # 仓库、分区、卡片/详情视图、表单解析
//! ├── admin/         # 管理面板操作
//! ├── waitlist/      # 候位表单与队列
//! ├── pages/         # HTML 页面
//! ├── api/           # JSON 路由和处理器
//! ├── services/      # 路由组装、访问日志
//! └── utils/         # 日志、错误转换
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod core;
pub mod menu;
pub mod message;
pub mod pages;
pub mod services;
pub mod utils;
pub mod waitlist;

// Re-export 公共类型
pub use auth::{AdminSession, AdminUser, JwtService, Session};
pub use core::{Config, Server, ServerState};
pub use message::MessageBus;
pub use services::build_app;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    __  ___
   /  |/  /__  ____  __  __
  / /|_/ / _ \/ __ \/ / / /
 / /  / /  __/ / / / /_/ /
/_/  /_/\___/_/ /_/\__,_/
    ____                       __
   / __ )____  ____ __________/ /
  / __  / __ \/ __ `/ ___/ __  /
 / /_/ / /_/ / /_/ / /  / /_/ /
/_____/\____/\__,_/_/   \__,_/
"#
    );
}

/// 进程级环境准备：加载 `.env`，初始化日志
///
/// 日志参数直接读环境变量，此时 [`Config`] 还没构建。
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());

    init_logger_with_file(&level, json, log_dir.as_deref())
}
