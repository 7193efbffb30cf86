//! Persisted client-side verdict cache.
//!
//! The poller keeps its own admin verdict separate from the server's role
//! cache. Entries live only in a [`VerdictStorage`] as JSON
//! [`CacheEntry`] values, so a restarted client can reuse them and writes
//! made by another instance are seen on the next read. Entries that fail
//! to parse are dropped and treated as a miss.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::CacheEntry;

/// String key/value storage that outlives the poller.
#[async_trait]
pub trait VerdictStorage: Send + Sync + fmt::Debug {
    /// Reads the raw value stored under `key`.
    async fn get(&self, key: &str) -> Option<String>;
    /// Writes `value` under `key`.
    async fn set(&self, key: &str, value: String);
    /// Deletes `key`.
    async fn remove(&self, key: &str);
}

/// Process-local [`VerdictStorage`].
#[derive(Debug, Default)]
pub struct MemoryVerdictStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryVerdictStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerdictStorage for MemoryVerdictStorage {
    async fn get(&self, key: &str) -> Option<String> {
        self.items.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.items.write().await.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.items.write().await.remove(key);
    }
}

/// Admin verdict cache for the poller, keyed by user identifier.
#[derive(Debug)]
pub struct PersistedVerdictCache {
    ttl: Duration,
    storage: Arc<dyn VerdictStorage>,
}

impl PersistedVerdictCache {
    /// Creates a cache with `ttl` over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn VerdictStorage>, ttl: Duration) -> Self {
        Self { ttl, storage }
    }

    /// Configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn storage_key(user: &str) -> String {
        format!("admin_status:{user}")
    }

    /// Returns the stored entry for `user`, fresh or not.
    pub async fn load(&self, user: &str) -> Option<CacheEntry<bool>> {
        let key = Self::storage_key(user);
        let raw = self.storage.get(&key).await?;
        match serde_json::from_str::<CacheEntry<bool>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(user, error = %e, "dropping corrupt cached verdict");
                self.storage.remove(&key).await;
                None
            }
        }
    }

    /// Returns the verdict for `user` if it is still fresh at `now`.
    pub async fn fresh(&self, user: &str, now: DateTime<Utc>) -> Option<bool> {
        self.load(user)
            .await
            .filter(|entry| entry.is_fresh(self.ttl(), now))
            .map(|entry| entry.value)
    }

    /// Records a verdict checked at `checked_at`.
    pub async fn store(&self, user: &str, is_admin: bool, checked_at: DateTime<Utc>) {
        let entry = CacheEntry::new(is_admin, checked_at);
        match serde_json::to_string(&entry) {
            Ok(raw) => self.storage.set(&Self::storage_key(user), raw).await,
            Err(e) => tracing::warn!(user, error = %e, "failed to persist verdict"),
        }
    }
}
