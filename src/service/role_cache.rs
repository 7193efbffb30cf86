//! Server-side role cache.
//!
//! [`RoleCache`] answers "is this user an administrator?" from a
//! [`TtlCache`] and falls back to the [`UserStore`] on a miss, on expiry,
//! or when the caller forces a refresh. The user record fetched with the
//! verdict is cached alongside it, so status responses within the TTL
//! never reach the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{CacheEntry, TtlCache, UserRecord};
use crate::error::GatewayError;
use crate::persistence::UserStore;

/// Default server-side TTL: five minutes.
pub const DEFAULT_ROLE_CACHE_TTL_SECS: i64 = 5 * 60;

/// Admin-role cache backed by the user store.
#[derive(Debug)]
pub struct RoleCache {
    cache: TtlCache<bool>,
    profiles: TtlCache<Option<UserRecord>>,
    users: Arc<dyn UserStore>,
}

impl RoleCache {
    /// Creates a cache with the given TTL in front of `users`.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
            profiles: TtlCache::new(ttl),
            users,
        }
    }

    /// Returns the user store the cache falls back to.
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// Resolves whether `user` is an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store has to be
    /// consulted and cannot be reached. Callers must deny in that case.
    pub async fn lookup(&self, user: &str, force_refresh: bool) -> Result<bool, GatewayError> {
        self.lookup_at(user, force_refresh, Utc::now()).await
    }

    /// [`RoleCache::lookup`] evaluated at an explicit instant.
    ///
    /// # Errors
    ///
    /// Same as [`RoleCache::lookup`].
    pub async fn lookup_at(
        &self,
        user: &str,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        if !force_refresh && let Some(is_admin) = self.cache.get_fresh(user, now).await {
            tracing::debug!(user, is_admin, "role cache hit");
            return Ok(is_admin);
        }
        let (is_admin, _) = self.fetch(user, force_refresh, now).await?;
        Ok(is_admin)
    }

    /// Like [`RoleCache::lookup`], also returning the user record the
    /// verdict was derived from.
    ///
    /// # Errors
    ///
    /// Same as [`RoleCache::lookup`].
    pub async fn lookup_profile(
        &self,
        user: &str,
        force_refresh: bool,
    ) -> Result<(bool, Option<UserRecord>), GatewayError> {
        self.lookup_profile_at(user, force_refresh, Utc::now()).await
    }

    /// [`RoleCache::lookup_profile`] evaluated at an explicit instant.
    ///
    /// # Errors
    ///
    /// Same as [`RoleCache::lookup`].
    pub async fn lookup_profile_at(
        &self,
        user: &str,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<(bool, Option<UserRecord>), GatewayError> {
        if !force_refresh
            && let Some(is_admin) = self.cache.get_fresh(user, now).await
            && let Some(record) = self.profiles.get_fresh(user, now).await
        {
            tracing::debug!(user, is_admin, "role cache hit");
            return Ok((is_admin, record));
        }
        self.fetch(user, force_refresh, now).await
    }

    async fn fetch(
        &self,
        user: &str,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<(bool, Option<UserRecord>), GatewayError> {
        tracing::debug!(user, force_refresh, "role cache miss, querying user store");
        let record = self
            .users
            .find_by_identifier(user)
            .await
            .map_err(|e| match e {
                GatewayError::StoreUnavailable(_) => e,
                other => GatewayError::StoreUnavailable(other.to_string()),
            })?;

        let is_admin = record.as_ref().is_some_and(UserRecord::is_admin);
        self.cache.insert(user, is_admin, now).await;
        self.profiles.insert(user, record.clone(), now).await;
        Ok((is_admin, record))
    }

    /// Best-effort read of the cached entry, expired or not. Never touches
    /// the store.
    pub async fn peek(&self, user: &str) -> Option<CacheEntry<bool>> {
        self.cache.peek(user).await
    }
}
