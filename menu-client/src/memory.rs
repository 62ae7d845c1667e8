//! In-process backend
//!
//! 与托管后端语义一致的内存实现：行存储、邮箱密码登录 (argon2)、
//! HS256 access token、"写操作需要有效 token" 的行级权限、
//! 每次写入发布 [`ChangeEvent`]。供集成测试和 demo 模式使用。
//!
//! 测试辅助：按操作计数 ([`MemoryBackend::calls`]) 和一次性故障注入
//! ([`MemoryBackend::fail_next`])。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use parking_lot::Mutex;
use shared::client::{AuthClaims, AuthSession, AuthUser};
use shared::message::{ChangeAction, ChangeEvent, Table};
use shared::models::{MenuFormData, MenuItem, WaitlistEntry, WaitlistFormData};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::client::{ChangeHub, DataClient};
use crate::{ClientError, ClientResult};

/// Operation kinds, for call counting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SelectMenus,
    InsertMenu,
    UpdateMenu,
    DeleteMenu,
    SelectWaitlist,
    InsertWaitlist,
    CompleteWaitlist,
    DeleteWaitlist,
    SignIn,
    SignOut,
    GetUser,
}

/// Token settings shared with the server's JWT validation
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub jwt_secret: String,
    pub audience: String,
    pub token_ttl: Duration,
}

impl MemoryConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            audience: "authenticated".to_string(),
            token_ttl: Duration::hours(1),
        }
    }
}

struct Account {
    id: String,
    email: String,
    hash_pass: String,
}

impl Account {
    fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

#[derive(Default)]
struct Store {
    menus: Vec<MenuItem>,
    waitlist: Vec<WaitlistEntry>,
    accounts: Vec<Account>,
    /// 已登出的 token
    revoked: Vec<String>,
    calls: HashMap<Operation, usize>,
    faults: HashMap<Operation, ClientError>,
}

/// Same-process backend implementing [`DataClient`]
pub struct MemoryBackend {
    config: MemoryConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    store: Mutex<Store>,
    hub: ChangeHub,
}

impl MemoryBackend {
    pub fn new(config: MemoryConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            store: Mutex::new(Store::default()),
            hub: ChangeHub::new(),
        }
    }

    /// Register an admin account; returns its user id
    pub fn add_admin(&self, email: &str, password: &str) -> ClientResult<String> {
        let hash_pass = hash_password(password)
            .map_err(|e| ClientError::Config(format!("password hashing failed: {e}")))?;
        let id = Uuid::new_v4().to_string();
        self.store.lock().accounts.push(Account {
            id: id.clone(),
            email: email.to_ascii_lowercase(),
            hash_pass,
        });
        Ok(id)
    }

    /// Seed rows directly (no token, no change events)
    pub fn seed_menus(&self, items: impl IntoIterator<Item = MenuItem>) {
        self.store.lock().menus.extend(items);
    }

    pub fn seed_waitlist(&self, entries: impl IntoIterator<Item = WaitlistEntry>) {
        self.store.lock().waitlist.extend(entries);
    }

    /// Number of calls made for an operation
    pub fn calls(&self, op: Operation) -> usize {
        self.store.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.store.lock().calls.clear();
    }

    /// Make the next call of `op` fail with a backend error carrying `message`
    pub fn fail_next(&self, op: Operation, message: impl Into<String>) {
        self.store
            .lock()
            .faults
            .insert(op, ClientError::api(500, message));
    }

    /// All waitlist rows including completed ones
    pub fn waitlist_rows(&self) -> Vec<WaitlistEntry> {
        self.store.lock().waitlist.clone()
    }

    /// 计数 + 取出注入的故障
    fn enter(&self, op: Operation) -> ClientResult<()> {
        let mut store = self.store.lock();
        *store.calls.entry(op).or_default() += 1;
        match store.faults.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn issue_token(&self, account: &Account) -> ClientResult<(String, i64)> {
        let now = Utc::now();
        let exp = (now + self.config.token_ttl).timestamp();
        let claims = AuthClaims {
            sub: account.id.clone(),
            email: Some(account.email.clone()),
            role: Some("authenticated".to_string()),
            aud: self.config.audience.clone(),
            exp,
            iat: now.timestamp(),
            session_id: Some(Uuid::new_v4().to_string()),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ClientError::Auth(format!("token generation failed: {e}")))?;
        Ok((token, exp))
    }

    /// 行级权限：有效且未登出的 token
    fn authorize(&self, token: &str) -> ClientResult<AuthClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["sub", "exp", "aud"]);

        let claims = decode::<AuthClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                    tracing::debug!("Expired token presented to memory backend");
                }
                ClientError::Unauthorized
            })?
            .claims;

        if self.store.lock().revoked.iter().any(|t| t == token) {
            return Err(ClientError::Unauthorized);
        }
        Ok(claims)
    }

    fn publish(&self, table: Table, action: ChangeAction, id: &str) {
        self.hub
            .publish(ChangeEvent::new(table, action, Some(id.to_string())));
    }
}

#[async_trait]
impl DataClient for MemoryBackend {
    async fn select_menus(&self) -> ClientResult<Vec<MenuItem>> {
        self.enter(Operation::SelectMenus)?;
        let mut items = self.store.lock().menus.clone();
        // stable: ties keep store order
        items.sort_by_key(|item| item.sort_order);
        Ok(items)
    }

    async fn insert_menu(&self, token: &str, form: &MenuFormData) -> ClientResult<MenuItem> {
        self.enter(Operation::InsertMenu)?;
        self.authorize(token)?;
        let item = form
            .clone()
            .into_item(Uuid::new_v4().to_string(), Utc::now());
        self.store.lock().menus.push(item.clone());
        self.publish(Table::Menus, ChangeAction::Insert, &item.id);
        Ok(item)
    }

    async fn update_menu(
        &self,
        token: &str,
        id: &str,
        form: &MenuFormData,
    ) -> ClientResult<MenuItem> {
        self.enter(Operation::UpdateMenu)?;
        self.authorize(token)?;
        let updated = {
            let mut store = self.store.lock();
            let slot = store
                .menus
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
            *slot = form.clone().into_item(id.to_string(), Utc::now());
            slot.clone()
        };
        self.publish(Table::Menus, ChangeAction::Update, id);
        Ok(updated)
    }

    async fn delete_menu(&self, token: &str, id: &str) -> ClientResult<()> {
        self.enter(Operation::DeleteMenu)?;
        self.authorize(token)?;
        {
            let mut store = self.store.lock();
            let before = store.menus.len();
            store.menus.retain(|item| item.id != id);
            if store.menus.len() == before {
                return Err(ClientError::NotFound(id.to_string()));
            }
        }
        self.publish(Table::Menus, ChangeAction::Delete, id);
        Ok(())
    }

    async fn select_active_waitlist(&self, token: &str) -> ClientResult<Vec<WaitlistEntry>> {
        self.enter(Operation::SelectWaitlist)?;
        self.authorize(token)?;
        let mut entries: Vec<WaitlistEntry> = self
            .store
            .lock()
            .waitlist
            .iter()
            .filter(|e| e.is_active())
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn insert_waitlist(&self, form: &WaitlistFormData) -> ClientResult<WaitlistEntry> {
        self.enter(Operation::InsertWaitlist)?;
        let form = form.normalized();
        let entry = {
            let mut store = self.store.lock();
            // created_at 单调，保证同一毫秒内的插入仍按到达顺序排列
            let now = Utc::now();
            let created_at = store
                .waitlist
                .iter()
                .map(|e| e.created_at)
                .max()
                .filter(|last| *last >= now)
                .map(|last| last + Duration::microseconds(1))
                .unwrap_or(now);
            let entry = WaitlistEntry {
                id: Uuid::new_v4().to_string(),
                customer_name: form.customer_name,
                people_count: form.people_count,
                created_at,
                completed_at: None,
            };
            store.waitlist.push(entry.clone());
            entry
        };
        self.publish(Table::Waitlist, ChangeAction::Insert, &entry.id);
        Ok(entry)
    }

    async fn complete_waitlist(
        &self,
        token: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> ClientResult<()> {
        self.enter(Operation::CompleteWaitlist)?;
        self.authorize(token)?;
        // 只更新未完成的行; 0 行受影响也算成功
        let updated = {
            let mut store = self.store.lock();
            match store
                .waitlist
                .iter_mut()
                .find(|e| e.id == id && e.completed_at.is_none())
            {
                Some(entry) => {
                    entry.completed_at = Some(at);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.publish(Table::Waitlist, ChangeAction::Update, id);
        }
        Ok(())
    }

    async fn delete_waitlist(&self, token: &str, id: &str) -> ClientResult<()> {
        self.enter(Operation::DeleteWaitlist)?;
        self.authorize(token)?;
        let removed = {
            let mut store = self.store.lock();
            let before = store.waitlist.len();
            store.waitlist.retain(|e| e.id != id);
            store.waitlist.len() != before
        };
        if removed {
            self.publish(Table::Waitlist, ChangeAction::Delete, id);
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        self.enter(Operation::SignIn)?;
        let email = email.trim().to_ascii_lowercase();
        let store = self.store.lock();
        let account = store
            .accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or_else(|| ClientError::Auth("Invalid login credentials".to_string()))?;

        let valid = account
            .verify_password(password)
            .map_err(|e| ClientError::Auth(format!("password check failed: {e}")))?;
        if !valid {
            return Err(ClientError::Auth("Invalid login credentials".to_string()));
        }

        let (access_token, expires_at) = self.issue_token(account)?;
        Ok(AuthSession {
            access_token,
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(expires_at),
            user: AuthUser {
                id: account.id.clone(),
                email: Some(account.email.clone()),
                role: "authenticated".to_string(),
            },
        })
    }

    async fn sign_out(&self, token: &str) -> ClientResult<()> {
        self.enter(Operation::SignOut)?;
        self.authorize(token)?;
        self.store.lock().revoked.push(token.to_string());
        Ok(())
    }

    async fn get_user(&self, token: &str) -> ClientResult<AuthUser> {
        self.enter(Operation::GetUser)?;
        let claims = self.authorize(token)?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role.unwrap_or_else(|| "authenticated".to_string()),
        })
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.hub.subscribe(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::MenuCategory;

    const SECRET: &str = "test-secret-that-is-long-enough-0123456789";

    fn backend() -> MemoryBackend {
        let backend = MemoryBackend::new(MemoryConfig::new(SECRET));
        backend.add_admin("admin@example.com", "pw-1234").unwrap();
        backend
    }

    fn form(name: &str, category: MenuCategory, sort_order: i32) -> MenuFormData {
        MenuFormData {
            category,
            name: name.into(),
            sort_order,
            ..MenuFormData::new_with_sort_order(0)
        }
    }

    async fn token(backend: &MemoryBackend) -> String {
        backend
            .sign_in("admin@example.com", "pw-1234")
            .await
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let backend = backend();
        let err = backend
            .sign_in("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Auth(ref m) if m == "Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_writes_require_token() {
        let backend = backend();
        let err = backend
            .insert_menu("not-a-token", &form("a", MenuCategory::Set, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));

        let token = token(&backend).await;
        backend
            .insert_menu(&token, &form("a", MenuCategory::Set, 0))
            .await
            .unwrap();
        assert_eq!(backend.select_menus().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_signed_out_token_rejected() {
        let backend = backend();
        let token = token(&backend).await;
        backend.sign_out(&token).await.unwrap();
        assert!(matches!(
            backend.get_user(&token).await,
            Err(ClientError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_select_menus_stable_by_sort_order() {
        let backend = backend();
        let token = token(&backend).await;
        for (name, order) in [("b", 2), ("a1", 1), ("a2", 1), ("z", 0)] {
            backend
                .insert_menu(&token, &form(name, MenuCategory::Signature, order))
                .await
                .unwrap();
        }
        let names: Vec<_> = backend
            .select_menus()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["z", "a1", "a2", "b"]);
    }

    #[tokio::test]
    async fn test_write_publishes_change() {
        let backend = backend();
        let mut rx = backend.subscribe(Table::Menus);
        let token = token(&backend).await;
        let item = backend
            .insert_menu(&token, &form("a", MenuCategory::Set, 0))
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, ChangeAction::Insert);
        assert_eq!(event.id, Some(item.id));
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let backend = backend();
        let token = token(&backend).await;
        assert!(
            backend
                .delete_menu(&token, "missing")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_waitlist_writes_are_idempotent() {
        let backend = backend();
        let token = token(&backend).await;
        let entry = backend
            .insert_waitlist(&WaitlistFormData::new("A", 2))
            .await
            .unwrap();
        let mut rx = backend.subscribe(Table::Waitlist);

        let first_done: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        backend
            .complete_waitlist(&token, &entry.id, first_done)
            .await
            .unwrap();
        backend
            .complete_waitlist(&token, &entry.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(backend.waitlist_rows()[0].completed_at, Some(first_done));

        backend.delete_waitlist(&token, &entry.id).await.unwrap();
        backend.delete_waitlist(&token, &entry.id).await.unwrap();
        backend
            .complete_waitlist(&token, &entry.id, Utc::now())
            .await
            .unwrap();
        assert!(backend.waitlist_rows().is_empty());

        // 只有真正改动行的两次写入发出通知
        assert_eq!(rx.recv().await.unwrap().action, ChangeAction::Update);
        assert_eq!(rx.recv().await.unwrap().action, ChangeAction::Delete);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_waitlist_active_ordered_by_arrival() {
        let backend = backend();
        let token = token(&backend).await;
        let first = backend
            .insert_waitlist(&WaitlistFormData::new("A", 2))
            .await
            .unwrap();
        let second = backend
            .insert_waitlist(&WaitlistFormData::new(" B ", 3))
            .await
            .unwrap();
        assert!(second.created_at > first.created_at);
        assert_eq!(second.customer_name, "B");

        backend
            .complete_waitlist(&token, &first.id, Utc::now())
            .await
            .unwrap();
        let active = backend.select_active_waitlist(&token).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let backend = backend();
        backend.fail_next(Operation::SelectMenus, "boom");
        let err = backend.select_menus().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(backend.select_menus().await.is_ok());
        assert_eq!(backend.calls(Operation::SelectMenus), 2);
    }
}
