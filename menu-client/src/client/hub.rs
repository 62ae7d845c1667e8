// menu-client/src/client/hub.rs
// 变更通知分发 - 每张表一个 broadcast 通道

use shared::message::{ChangeEvent, Table};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Per-table change broadcast
///
/// Realtime feed 和 in-process 后端都往这里发布，订阅方按表拿 Receiver。
#[derive(Debug, Clone)]
pub struct ChangeHub {
    menus: broadcast::Sender<ChangeEvent>,
    waitlist: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (menus, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (waitlist, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { menus, waitlist }
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<ChangeEvent> {
        match table {
            Table::Menus => &self.menus,
            Table::Waitlist => &self.waitlist,
        }
    }

    pub fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.sender(table).subscribe()
    }

    /// 没有订阅者时直接丢弃
    pub fn publish(&self, event: ChangeEvent) {
        let table = event.table;
        if self.sender(table).send(event).is_err() {
            tracing::trace!(%table, "No subscribers for change event");
        }
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::ChangeAction;

    #[tokio::test]
    async fn test_routes_by_table() {
        let hub = ChangeHub::new();
        let mut menus = hub.subscribe(Table::Menus);
        let mut waitlist = hub.subscribe(Table::Waitlist);

        hub.publish(ChangeEvent::new(Table::Menus, ChangeAction::Insert, Some("m1".into())));

        let event = menus.recv().await.unwrap();
        assert_eq!(event.id.as_deref(), Some("m1"));
        assert!(waitlist.try_recv().is_err());
    }
}
