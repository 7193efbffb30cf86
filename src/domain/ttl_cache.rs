//! Fixed-window TTL cache keyed by user identifier.
//!
//! [`TtlCache`] backs the server-side role cache. [`CacheEntry`] and its
//! freshness rule are shared with the client-side verdict cache used by
//! the status poller. Entries are overwritten on
//! refresh and never evicted; the key space is bounded by distinct users.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A cached value together with the time it was checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,
    /// When the value was fetched from its source of truth.
    pub checked_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry checked at `checked_at`.
    pub const fn new(value: V, checked_at: DateTime<Utc>) -> Self {
        Self { value, checked_at }
    }

    /// Returns `true` if the entry is still inside its TTL window at `now`.
    ///
    /// An entry exactly `ttl` old is expired.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.checked_at) < ttl
    }
}

/// Concurrent map from key to [`CacheEntry`] with a fixed TTL.
///
/// Reads and overwrites may happen concurrently; the last write for a key
/// wins. There is no cross-key consistency.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value for `key` if an entry exists and is fresh at `now`.
    pub async fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let map = self.entries.read().await;
        map.get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.value.clone())
    }

    /// Returns the raw entry for `key`, expired or not.
    ///
    /// Best-effort read: callers must check freshness themselves before
    /// trusting the value.
    pub async fn peek(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Stores or overwrites the entry for `key`.
    pub async fn insert(&self, key: &str, value: V, checked_at: DateTime<Utc>) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(value, checked_at));
    }

    /// Returns the number of stored entries, including expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_entry_is_returned() {
        let cache = TtlCache::new(Duration::minutes(5));
        let now = Utc::now();
        cache.insert("u1", true, now).await;
        assert_eq!(cache.get_fresh("u1", now + Duration::minutes(4)).await, Some(true));
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_absent() {
        let cache = TtlCache::new(Duration::minutes(5));
        let now = Utc::now();
        cache.insert("u1", true, now).await;
        assert_eq!(cache.get_fresh("u1", now + Duration::minutes(5)).await, None);
        assert!(cache.peek("u1").await.is_some());
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_timestamp() {
        let cache = TtlCache::new(Duration::minutes(5));
        let then = Utc::now();
        cache.insert("u1", true, then).await;
        let later = then + Duration::minutes(10);
        cache.insert("u1", false, later).await;
        assert_eq!(cache.get_fresh("u1", later).await, Some(false));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = TtlCache::new(Duration::minutes(5));
        let now = Utc::now();
        cache.insert("a", true, now).await;
        assert_eq!(cache.get_fresh("b", now).await, None);
        assert!(!cache.is_empty().await);
    }
}
