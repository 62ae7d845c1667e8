//! 消息总线消息类型定义
//!
//! 数据变更通知 (来自托管后端的 realtime 推送或本进程的写操作)
//! 以及会话状态变更事件，在 menu-client 与 menu-server 之间共享。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// 后端数据表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Menus,
    Waitlist,
}

impl Table {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Table::Menus => "menus",
            Table::Waitlist => "waitlist",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menus" => Ok(Table::Menus),
            "waitlist" => Ok(Table::Waitlist),
            other => Err(AppError::invalid_request(format!("unknown table: {other}"))),
        }
    }
}

/// 变更类型 (与 postgres_changes 的 eventType 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

impl FromStr for ChangeAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeAction::Insert),
            "UPDATE" => Ok(ChangeAction::Update),
            "DELETE" => Ok(ChangeAction::Delete),
            other => Err(AppError::invalid_request(format!("unknown change action: {other}"))),
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Insert => write!(f, "INSERT"),
            ChangeAction::Update => write!(f, "UPDATE"),
            ChangeAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// 单行变更通知
///
/// 接收方只把它当作"需要重新拉取"的信号，不做增量合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    pub id: Option<String>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, id: Option<String>) -> Self {
        Self {
            table,
            action,
            id,
            at: Utc::now(),
        }
    }
}

/// 总线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 数据变更
    DataChanged,
    /// 会话状态变更 (登录 / 登出)
    AuthStateChanged,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::DataChanged => write!(f, "data_changed"),
            EventType::AuthStateChanged => write!(f, "auth_state_changed"),
        }
    }
}

/// 会话状态变更载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatePayload {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

/// 总线载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum BusPayload {
    Change(ChangeEvent),
    Auth(AuthStatePayload),
}

/// 消息总线消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub payload: BusPayload,
}

impl BusMessage {
    pub fn new(payload: BusPayload) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            payload,
        }
    }

    /// 创建数据变更消息
    pub fn change(event: ChangeEvent) -> Self {
        Self::new(BusPayload::Change(event))
    }

    /// 创建会话状态变更消息
    pub fn auth_state_changed(authenticated: bool, user_id: Option<String>) -> Self {
        Self::new(BusPayload::Auth(AuthStatePayload {
            authenticated,
            user_id,
        }))
    }

    pub fn event_type(&self) -> EventType {
        match self.payload {
            BusPayload::Change(_) => EventType::DataChanged,
            BusPayload::Auth(_) => EventType::AuthStateChanged,
        }
    }

    /// 如果是指定表的变更则返回该事件
    pub fn change_for(&self, table: Table) -> Option<&ChangeEvent> {
        match &self.payload {
            BusPayload::Change(event) if event.table == table => Some(event),
            _ => None,
        }
    }
}
