//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::accounts::{AccountError, AccountResult, PasswordCipher, User, UserManager, UserStore};
use crate::config::ThumbnailConfig;
use crate::storage::StorageClient;

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryStorage {
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().await.get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Bytes> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|(b, _)| b.clone())
            .ok_or_else(|| anyhow::anyhow!("no such key: {}", key))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<HashMap<Uuid, User>>,
}

fn stamp(previous: Option<OffsetDateTime>) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    match previous {
        Some(p) if now <= p => p + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> AccountResult<User> {
        let mut rows = self.rows.lock().await;
        if rows.values().any(|u| u.email == user.email) {
            return Err(AccountError::EmailTaken);
        }
        let mut row = user.clone();
        row.adding = false;
        row.date_joined = OffsetDateTime::now_utc();
        row.date_updated = Some(stamp(None));
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> AccountResult<User> {
        self.rows
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(AccountError::NotFound { id })
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> AccountResult<Vec<User>> {
        let mut all: Vec<User> = self.rows.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
        Ok(all)
    }

    async fn update(&self, user: &User, expected: Option<OffsetDateTime>) -> AccountResult<User> {
        let mut rows = self.rows.lock().await;
        if rows.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AccountError::EmailTaken);
        }
        let stored = rows
            .get(&user.id)
            .ok_or(AccountError::NotFound { id: user.id })?;
        if stored.date_updated != expected {
            return Err(AccountError::Conflict { id: user.id });
        }
        let mut row = user.clone();
        row.adding = false;
        row.date_joined = stored.date_joined;
        row.date_updated = Some(stamp(stored.date_updated));
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AccountResult<()> {
        self.rows
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AccountError::NotFound { id })
    }
}

pub const TEST_KEY: [u8; 32] = [42u8; 32];

pub struct Harness {
    pub manager: UserManager,
    pub store: Arc<MemoryUserStore>,
    pub storage: Arc<MemoryStorage>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryUserStore::default());
    let storage = Arc::new(MemoryStorage::default());
    let manager = UserManager::new(
        store.clone(),
        storage.clone(),
        PasswordCipher::new(&TEST_KEY),
        ThumbnailConfig::default(),
    );
    Harness {
        manager,
        store,
        storage,
    }
}
