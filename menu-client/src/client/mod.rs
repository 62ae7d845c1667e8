//! Data client - 托管后端的读写、认证与变更订阅

mod hub;
mod rest;

pub use hub::ChangeHub;
pub use rest::RestClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::client::{AuthSession, AuthUser};
use shared::message::{ChangeEvent, Table};
use shared::models::{MenuFormData, MenuItem, WaitlistEntry, WaitlistFormData};
use tokio::sync::broadcast;

use crate::ClientResult;

/// Data client trait
///
/// `token` 参数是调用方会话的 access token；匿名操作不需要。
/// 写操作的权限由后端判定 (hosted 模式下是行级安全策略)。
#[async_trait]
pub trait DataClient: Send + Sync {
    // ── menus ──

    /// All menu rows, `sort_order` ascending
    async fn select_menus(&self) -> ClientResult<Vec<MenuItem>>;

    async fn insert_menu(&self, token: &str, form: &MenuFormData) -> ClientResult<MenuItem>;

    /// Full-row overwrite keyed by id
    async fn update_menu(&self, token: &str, id: &str, form: &MenuFormData)
    -> ClientResult<MenuItem>;

    async fn delete_menu(&self, token: &str, id: &str) -> ClientResult<()>;

    // ── waitlist ──

    /// Entries with `completed_at` absent, `created_at` ascending
    async fn select_active_waitlist(&self, token: &str) -> ClientResult<Vec<WaitlistEntry>>;

    async fn insert_waitlist(&self, form: &WaitlistFormData) -> ClientResult<WaitlistEntry>;

    /// Sets `completed_at` on an active entry. A missing or already completed
    /// entry is not an error (zero affected rows).
    async fn complete_waitlist(&self, token: &str, id: &str, at: DateTime<Utc>)
    -> ClientResult<()>;

    /// Removes an entry by id; zero affected rows is success.
    async fn delete_waitlist(&self, token: &str, id: &str) -> ClientResult<()>;

    // ── auth ──

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    async fn sign_out(&self, token: &str) -> ClientResult<()>;

    async fn get_user(&self, token: &str) -> ClientResult<AuthUser>;

    // ── realtime ──

    /// Change feed of one table
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent>;
}
