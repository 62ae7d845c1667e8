//! 菜单仓库
//!
//! 持有最近一次成功加载的全量快照 (含分类分区)。任何菜单表变更通知都触发
//! 整表重拉，不做增量修补。
//!
//! 并发重拉不取消，每次重拉领取一个递增票号，只有票号比已应用快照新的结果
//! 才会被应用: 最后发起的请求胜出，而不是最后返回的。失败不占票号，
//! 还没有成功快照时任何一次成功都会被应用。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use menu_client::DataClient;
use parking_lot::RwLock;
use serde::Serialize;
use shared::message::{BusMessage, BusPayload, ChangeAction, ChangeEvent, Table};
use shared::models::MenuItem;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::board::MenuBoard;
use crate::core::state::ResourceVersions;
use crate::message::MessageBus;
use crate::utils::{AppError, AppResult};

/// 加载状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    /// 首次加载尚未完成
    Loading,
    Ready,
    /// 首次加载全部失败，页面显示提示而不是空菜单
    Failed(String),
}

/// 一次加载的结果
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Vec<MenuItem>,
    pub board: MenuBoard,
    pub status: LoadStatus,
    /// 产生该快照的票号，0 表示还没有成功加载过
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            board: MenuBoard::default(),
            status: LoadStatus::Loading,
            generation: 0,
            loaded_at: None,
        }
    }

    fn ready(items: Vec<MenuItem>, generation: u64) -> Self {
        let board = MenuBoard::build(&items);
        Self {
            items,
            board,
            status: LoadStatus::Ready,
            generation,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == LoadStatus::Ready
    }
}

pub struct MenuRepository {
    client: Arc<dyn DataClient>,
    snapshot: RwLock<Arc<Snapshot>>,
    next_ticket: AtomicU64,
}

impl std::fmt::Debug for MenuRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuRepository")
            .field("generation", &self.snapshot.read().generation)
            .finish_non_exhaustive()
    }
}

impl MenuRepository {
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        Self {
            client,
            snapshot: RwLock::new(Arc::new(Snapshot::loading())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// 当前条目数 (新建表单的默认 sort_order)
    pub fn item_count(&self) -> usize {
        self.snapshot.read().items.len()
    }

    /// 整表重拉
    ///
    /// 失败时保留上一次成功的快照；还没有成功过则记为 `Failed`
    pub async fn refresh(&self) -> AppResult<Arc<Snapshot>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        match self.client.select_menus().await {
            Ok(items) => Ok(self.apply(ticket, items)),
            Err(e) => {
                let err = AppError::from(e);
                tracing::warn!(ticket, error = %err, "Menu refresh failed");
                self.mark_failed(ticket, &err);
                Err(err)
            }
        }
    }

    fn apply(&self, ticket: u64, items: Vec<MenuItem>) -> Arc<Snapshot> {
        let mut guard = self.snapshot.write();
        if ticket <= guard.generation {
            tracing::debug!(ticket, applied = guard.generation, "Discarding stale menu load");
            return guard.clone();
        }

        let snapshot = Arc::new(Snapshot::ready(items, ticket));
        tracing::debug!(ticket, items = snapshot.items.len(), "Menu snapshot applied");
        *guard = snapshot.clone();
        snapshot
    }

    fn mark_failed(&self, ticket: u64, err: &AppError) {
        let mut guard = self.snapshot.write();
        if guard.is_ready() {
            return;
        }
        tracing::debug!(ticket, "Menu snapshot marked failed");
        let mut failed = Snapshot::loading();
        failed.status = LoadStatus::Failed(err.message.clone());
        *guard = Arc::new(failed);
    }

    /// 首次加载，最多尝试 `attempts` 次，线性退避
    pub async fn initial_load(&self, attempts: u32, backoff: Duration) -> Arc<Snapshot> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            match self.refresh().await {
                Ok(snapshot) => {
                    tracing::info!(attempt, items = snapshot.items.len(), "Menus loaded");
                    return snapshot;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(attempt, attempts, "Initial menu load failed: {}", e);
                    tokio::time::sleep(backoff * attempt).await;
                }
                Err(e) => {
                    tracing::error!(attempts, "Initial menu load gave up: {}", e);
                }
            }
        }
        self.snapshot()
    }

    /// 后台监听: 数据变更 → 重拉并转发到总线；登出 → 重拉
    pub fn spawn_listener(
        self: &Arc<Self>,
        bus: MessageBus,
        versions: Arc<ResourceVersions>,
    ) -> JoinHandle<()> {
        let repository = Arc::clone(self);
        tokio::spawn(async move { repository.listen(bus, versions).await })
    }

    async fn listen(&self, bus: MessageBus, versions: Arc<ResourceVersions>) {
        let shutdown = bus.shutdown_token().clone();
        let mut menus_rx = self.client.subscribe(Table::Menus);
        let mut waitlist_rx = self.client.subscribe(Table::Waitlist);
        let mut bus_rx = bus.subscribe();
        let (mut menus_open, mut waitlist_open, mut bus_open) = (true, true, true);

        tracing::debug!("Menu listener started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                received = menus_rx.recv(), if menus_open => match received {
                    Ok(event) => self.on_menu_change(event, &bus, &versions).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Menu change feed lagged, reloading");
                        let resync = ChangeEvent::new(Table::Menus, ChangeAction::Update, None);
                        self.on_menu_change(resync, &bus, &versions).await;
                    }
                    Err(RecvError::Closed) => menus_open = false,
                },

                received = waitlist_rx.recv(), if waitlist_open => match received {
                    Ok(event) => {
                        versions.increment(Table::Waitlist.as_str());
                        bus.publish(BusMessage::change(event));
                    }
                    Err(RecvError::Lagged(_)) => {
                        versions.increment(Table::Waitlist.as_str());
                        let resync = ChangeEvent::new(Table::Waitlist, ChangeAction::Update, None);
                        bus.publish(BusMessage::change(resync));
                    }
                    Err(RecvError::Closed) => waitlist_open = false,
                },

                received = bus_rx.recv(), if bus_open => match received {
                    Ok(BusMessage { payload: BusPayload::Auth(auth), .. }) if !auth.authenticated => {
                        if let Err(e) = self.refresh().await {
                            tracing::warn!("Menu refresh after sign-out failed: {}", e);
                        }
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => bus_open = false,
                },
            }
        }
        tracing::debug!("Menu listener stopped");
    }

    async fn on_menu_change(&self, event: ChangeEvent, bus: &MessageBus, versions: &ResourceVersions) {
        versions.increment(Table::Menus.as_str());
        // 失败时保留旧快照，已在 refresh 内记录
        if self.refresh().await.is_ok() {
            bus.publish(BusMessage::change(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use menu_client::{ChangeHub, ClientError, ClientResult};
    use parking_lot::Mutex;
    use shared::client::{AuthSession, AuthUser};
    use shared::models::{MenuCategory, MenuFormData, WaitlistEntry, WaitlistFormData};
    use std::collections::VecDeque;
    use tokio::sync::{broadcast, oneshot};

    fn item(id: &str) -> MenuItem {
        MenuItem {
            id: id.into(),
            category: MenuCategory::Single,
            name: id.into(),
            description: String::new(),
            price: 9000,
            tags: vec![],
            allergens: vec![],
            origin: String::new(),
            media_url: None,
            sort_order: 0,
            is_soldout: false,
            updated_at: Utc::now(),
        }
    }

    type Reply = ClientResult<Vec<MenuItem>>;

    /// 每次 select_menus 按顺序取一个预设回复；回复可以延迟到测试放行
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        hub: ChangeHub,
    }

    impl ScriptedClient {
        fn push(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().push_back(rx);
            tx
        }
    }

    fn unused<T>() -> ClientResult<T> {
        Err(ClientError::Config("not scripted".into()))
    }

    #[async_trait]
    impl DataClient for ScriptedClient {
        async fn select_menus(&self) -> ClientResult<Vec<MenuItem>> {
            let rx = self.replies.lock().pop_front();
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| unused()),
                None => unused(),
            }
        }
        async fn insert_menu(&self, _: &str, _: &MenuFormData) -> ClientResult<MenuItem> {
            unused()
        }
        async fn update_menu(&self, _: &str, _: &str, _: &MenuFormData) -> ClientResult<MenuItem> {
            unused()
        }
        async fn delete_menu(&self, _: &str, _: &str) -> ClientResult<()> {
            unused()
        }
        async fn select_active_waitlist(&self, _: &str) -> ClientResult<Vec<WaitlistEntry>> {
            unused()
        }
        async fn insert_waitlist(&self, _: &WaitlistFormData) -> ClientResult<WaitlistEntry> {
            unused()
        }
        async fn complete_waitlist(&self, _: &str, _: &str, _: DateTime<Utc>) -> ClientResult<()> {
            unused()
        }
        async fn delete_waitlist(&self, _: &str, _: &str) -> ClientResult<()> {
            unused()
        }
        async fn sign_in(&self, _: &str, _: &str) -> ClientResult<AuthSession> {
            unused()
        }
        async fn sign_out(&self, _: &str) -> ClientResult<()> {
            unused()
        }
        async fn get_user(&self, _: &str) -> ClientResult<AuthUser> {
            unused()
        }
        fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
            self.hub.subscribe(table)
        }
    }

    #[tokio::test]
    async fn test_latest_started_refresh_wins() {
        let client = Arc::new(ScriptedClient::default());
        let slow = client.push();
        let fast = client.push();
        let repo = Arc::new(MenuRepository::new(client.clone()));

        let first = tokio::spawn({
            let repo = repo.clone();
            async move { repo.refresh().await }
        });
        // 确保第一次请求先领票
        while client.replies.lock().len() == 2 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let repo = repo.clone();
            async move { repo.refresh().await }
        });
        while !client.replies.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        fast.send(Ok(vec![item("new")])).unwrap();
        second.await.unwrap().unwrap();
        slow.send(Ok(vec![item("old")])).unwrap();
        first.await.unwrap().unwrap();

        let snapshot = repo.snapshot();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.items[0].id, "new");
    }

    #[tokio::test]
    async fn test_older_success_replaces_newer_failure() {
        let client = Arc::new(ScriptedClient::default());
        let slow = client.push();
        let failing = client.push();
        let repo = Arc::new(MenuRepository::new(client.clone()));

        let first = tokio::spawn({
            let repo = repo.clone();
            async move { repo.refresh().await }
        });
        while client.replies.lock().len() == 2 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let repo = repo.clone();
            async move { repo.refresh().await }
        });
        while !client.replies.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        failing.send(Err(ClientError::api(503, "unavailable"))).unwrap();
        assert!(second.await.unwrap().is_err());
        assert_eq!(repo.snapshot().status, LoadStatus::Failed("unavailable".into()));

        slow.send(Ok(vec![item("a")])).unwrap();
        first.await.unwrap().unwrap();
        let snapshot = repo.snapshot();
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.items[0].id, "a");
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_snapshot() {
        let client = Arc::new(ScriptedClient::default());
        client.push().send(Ok(vec![item("a")])).unwrap();
        client.push().send(Err(ClientError::api(500, "boom"))).unwrap();
        let repo = MenuRepository::new(client);

        repo.refresh().await.unwrap();
        let err = repo.refresh().await.unwrap_err();
        assert_eq!(err.message, "boom");

        let snapshot = repo.snapshot();
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.items.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_retries_then_reports_failure() {
        let client = Arc::new(ScriptedClient::default());
        for _ in 0..3 {
            client.push().send(Err(ClientError::api(503, "unavailable"))).unwrap();
        }
        let repo = MenuRepository::new(client.clone());
        assert_eq!(repo.snapshot().status, LoadStatus::Loading);

        let snapshot = repo.initial_load(3, Duration::from_millis(100)).await;
        assert_eq!(snapshot.status, LoadStatus::Failed("unavailable".into()));
        assert!(snapshot.board.is_empty());
        assert!(client.replies.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_recovers_on_retry() {
        let client = Arc::new(ScriptedClient::default());
        client.push().send(Err(ClientError::api(503, "unavailable"))).unwrap();
        client.push().send(Ok(vec![item("a"), item("b")])).unwrap();
        let repo = MenuRepository::new(client);

        let snapshot = repo.initial_load(3, Duration::from_millis(100)).await;
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.board.section(MenuCategory::Single).len(), 2);
    }

    #[tokio::test]
    async fn test_listener_reloads_on_change_and_forwards() {
        let client = Arc::new(ScriptedClient::default());
        client.push().send(Ok(vec![item("a")])).unwrap();
        let repo = Arc::new(MenuRepository::new(client.clone()));
        let bus = MessageBus::new();
        let versions = Arc::new(ResourceVersions::new());
        let mut bus_rx = bus.subscribe();

        let handle = repo.spawn_listener(bus.clone(), versions.clone());
        // 让监听任务先完成订阅
        tokio::time::sleep(Duration::from_millis(20)).await;

        client
            .hub
            .publish(ChangeEvent::new(Table::Menus, ChangeAction::Insert, Some("a".into())));
        let msg = tokio::time::timeout(Duration::from_secs(5), bus_rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(msg.change_for(Table::Menus).and_then(|e| e.id.as_deref()), Some("a"));
        assert_eq!(repo.snapshot().items.len(), 1);
        assert_eq!(versions.get(Table::Menus.as_str()), 1);

        bus.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_reloads_after_sign_out() {
        let client = Arc::new(ScriptedClient::default());
        let reply = client.push();
        let repo = Arc::new(MenuRepository::new(client.clone()));
        let bus = MessageBus::new();
        let handle = repo.spawn_listener(bus.clone(), Arc::new(ResourceVersions::new()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        bus.publish(BusMessage::auth_state_changed(true, Some("u1".into())));
        bus.publish(BusMessage::auth_state_changed(false, None));
        reply.send(Ok(vec![item("a")])).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while !repo.snapshot().is_ready() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        bus.shutdown();
        handle.await.unwrap();
    }
}
