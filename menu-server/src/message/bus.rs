//! 进程内消息总线
//!
//! # 消息流
//!
//! ```text
//! RealtimeFeed / MemoryBackend ──▶ ChangeHub ──▶ MenuRepository listener ──┐
//!                                                                          ▼
//! AdminPanel (login / logout) ───────────────────────────────▶ MessageBus::publish
//!                                                                          │
//!                                                     /api/events (SSE), 测试订阅者
//! ```

use shared::message::BusMessage;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// 默认通道容量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// 消息总线 - 进程内广播
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    /// 关闭信号令牌
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// 创建默认容量的消息总线
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 创建指定容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 发布消息到所有订阅者
    ///
    /// 没有订阅者不算错误，返回收到消息的订阅者数量
    pub fn publish(&self, msg: BusMessage) -> usize {
        let event_type = msg.event_type();
        match self.tx.send(msg) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(%event_type, "No bus subscribers");
                0
            }
        }
    }

    /// 订阅总线消息
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// 关闭信号令牌 (后台任务共享)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 通知所有后台任务退出
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
