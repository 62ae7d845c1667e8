//! 候位队列管理 (管理员)
//!
//! 打开时加载未完成的条目，按登记时间排序并编号 (从 1 开始)。
//! 完成、删除都需要确认，按 id 操作，可重复执行。

use std::sync::Arc;

use chrono::Utc;
use menu_client::DataClient;
use serde::Serialize;
use shared::models::WaitlistEntry;

use crate::auth::AdminUser;
use crate::utils::{AppError, AppResult, waitlist_error};

pub const LOAD_FAILED_PREFIX: &str = "대기 목록 로드 실패: ";
pub const COMPLETE_FAILED_PREFIX: &str = "완료 처리 실패: ";
pub const DELETE_FAILED_PREFIX: &str = "삭제 실패: ";
pub const EMPTY_QUEUE_MESSAGE: &str = "대기 중인 손님이 없습니다.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueRow {
    /// 1-based
    pub position: usize,
    #[serde(flatten)]
    pub entry: WaitlistEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WaitlistQueue {
    rows: Vec<QueueRow>,
}

impl WaitlistQueue {
    /// 排除已完成条目，按 `created_at` 稳定排序后编号
    pub fn from_entries(entries: Vec<WaitlistEntry>) -> Self {
        let mut active: Vec<_> = entries.into_iter().filter(WaitlistEntry::is_active).collect();
        active.sort_by_key(|entry| entry.created_at);

        let rows = active
            .into_iter()
            .enumerate()
            .map(|(i, entry)| QueueRow {
                position: i + 1,
                entry,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[QueueRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn find(&self, id: &str) -> Option<&QueueRow> {
        self.rows.iter().find(|row| row.entry.id == id)
    }
}

/// 队列操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Complete,
    Delete,
}

impl QueueAction {
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Complete => COMPLETE_FAILED_PREFIX,
            Self::Delete => DELETE_FAILED_PREFIX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }
}

pub struct WaitlistManager {
    client: Arc<dyn DataClient>,
}

impl WaitlistManager {
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        Self { client }
    }

    pub async fn load(&self, user: &AdminUser) -> AppResult<WaitlistQueue> {
        let entries = self
            .client
            .select_active_waitlist(&user.token)
            .await
            .map_err(AppError::from)?;
        Ok(WaitlistQueue::from_entries(entries))
    }

    /// 执行一次已确认的操作，成功后重新加载队列
    pub async fn apply(
        &self,
        user: &AdminUser,
        action: QueueAction,
        id: &str,
        confirmed: bool,
    ) -> AppResult<WaitlistQueue> {
        if !confirmed {
            return Err(AppError::confirmation_required(action.as_str()));
        }

        match action {
            QueueAction::Complete => self
                .client
                .complete_waitlist(&user.token, id, Utc::now())
                .await
                .map_err(waitlist_error(id))?,
            QueueAction::Delete => self
                .client
                .delete_waitlist(&user.token, id)
                .await
                .map_err(waitlist_error(id))?,
        }

        tracing::info!(user_id = %user.id, entry_id = %id, action = action.as_str(), "Waitlist entry updated");
        self.load(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn entry(id: &str, minutes: i64, completed: bool) -> WaitlistEntry {
        let base: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        WaitlistEntry {
            id: id.into(),
            customer_name: id.to_uppercase(),
            people_count: 2,
            created_at: base + Duration::minutes(minutes),
            completed_at: completed.then(|| base + Duration::hours(1)),
        }
    }

    #[test]
    fn test_queue_orders_and_numbers_active_entries() {
        let queue = WaitlistQueue::from_entries(vec![
            entry("c", 30, false),
            entry("a", 10, false),
            entry("done", 5, true),
            entry("b", 20, false),
        ]);

        let rows: Vec<_> = queue
            .rows()
            .iter()
            .map(|r| (r.position, r.entry.id.as_str()))
            .collect();
        assert_eq!(rows, [(1, "a"), (2, "b"), (3, "c")]);
        assert!(queue.find("done").is_none());
    }

    #[test]
    fn test_equal_timestamps_keep_load_order() {
        let queue = WaitlistQueue::from_entries(vec![entry("x", 0, false), entry("y", 0, false)]);
        assert_eq!(queue.rows()[0].entry.id, "x");
        assert_eq!(queue.rows()[1].position, 2);
    }

    #[test]
    fn test_empty_queue() {
        assert!(WaitlistQueue::from_entries(vec![entry("d", 0, true)]).is_empty());
    }

    #[test]
    fn test_row_serializes_flat() {
        let queue = WaitlistQueue::from_entries(vec![entry("a", 0, false)]);
        let json = serde_json::to_value(&queue).unwrap();
        assert_eq!(json[0]["position"], 1);
        assert_eq!(json[0]["id"], "a");
    }
}
