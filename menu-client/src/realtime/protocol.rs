//! Phoenix channel 报文 (realtime vsn 1.0.0)
//!
//! 每帧是 `{topic, event, payload, ref}` 的 JSON 对象。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::message::{ChangeAction, ChangeEvent, Table};

pub const HEARTBEAT_TOPIC: &str = "phoenix";
pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

pub fn topic_for(table: Table) -> String {
    format!("realtime:public:{}", table.as_str())
}

/// 订阅某张表的全部变更
pub fn join(table: Table, access_token: &str, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic_for(table),
        event: EVENT_JOIN.to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table.as_str() }
                ]
            },
            "access_token": access_token,
        }),
        reference: Some(reference.to_string()),
    }
}

pub fn heartbeat(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: HEARTBEAT_TOPIC.to_string(),
        event: EVENT_HEARTBEAT.to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

impl PhoenixMessage {
    /// phx_reply 的 status 是否为 error
    pub fn is_error_reply(&self) -> bool {
        self.event == EVENT_REPLY && self.payload.get("status").and_then(Value::as_str) == Some("error")
    }

    /// 服务端关闭 / 报错的通道
    pub fn is_channel_down(&self) -> bool {
        self.event == EVENT_ERROR || self.event == EVENT_CLOSE
    }

    /// 解析行变更
    ///
    /// 新格式: event = "postgres_changes", payload.data 内含 type/table/record；
    /// 旧格式: event 本身就是 INSERT/UPDATE/DELETE, payload 即 data。
    pub fn to_change_event(&self) -> Option<ChangeEvent> {
        let data = if self.event == EVENT_POSTGRES_CHANGES {
            self.payload.get("data")?
        } else if self.event.parse::<ChangeAction>().is_ok() {
            &self.payload
        } else {
            return None;
        };

        let action = data
            .get("type")
            .or_else(|| data.get("eventType"))
            .and_then(Value::as_str)?
            .parse::<ChangeAction>()
            .ok()?;
        let table = data.get("table").and_then(Value::as_str)?.parse::<Table>().ok()?;
        let id = ["record", "old_record"]
            .iter()
            .filter_map(|key| data.get(*key)?.get("id"))
            .find_map(value_to_id);

        Some(ChangeEvent::new(table, action, id))
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
