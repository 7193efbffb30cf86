//! Persistence layer: user and entity store collaborators.
//!
//! [`UserStore`] and [`EntityStore`] abstract the external document store.
//! Two implementations are provided: [`memory::InMemoryStore`] for tests
//! and local runs, and [`postgres::PostgresStore`] backed by `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    EntityId, EntitySummary, InteractionKind, MarketplaceStats, TrackedEntity, TrackingEvent,
    UserRecord,
};
use crate::error::GatewayError;

/// Attempts made by the optimistic append fallback before giving up.
pub const MAX_APPEND_ATTEMPTS: u32 = 5;

/// Read-only access to user records.
#[async_trait]
pub trait UserStore: Send + Sync + fmt::Debug {
    /// Finds the user with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the store cannot be
    /// reached. A missing record is `Ok(None)`, never an error.
    async fn find_by_identifier(&self, identifier: &str)
    -> Result<Option<UserRecord>, GatewayError>;
}

/// Storage for tracked entities and their interaction logs.
#[async_trait]
pub trait EntityStore: Send + Sync + fmt::Debug {
    /// Inserts a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the ID already exists,
    /// or a store error on failure.
    async fn insert(&self, entity: TrackedEntity) -> Result<EntityId, GatewayError>;

    /// Loads an entity with both logs.
    ///
    /// # Errors
    ///
    /// Returns a store error on failure. A missing entity is `Ok(None)`.
    async fn find_by_id(&self, id: EntityId) -> Result<Option<TrackedEntity>, GatewayError>;

    /// Replaces the stored entity if its version still equals
    /// `expected_version`, returning the new version.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::VersionConflict`] when another writer got
    /// there first, [`GatewayError::EntityNotFound`] if the entity is gone,
    /// or a store error on failure.
    async fn save(&self, entity: &TrackedEntity, expected_version: u64)
    -> Result<u64, GatewayError>;

    /// Appends an event to the selected log and re-derives the counter,
    /// returning the new counter value.
    ///
    /// The default implementation is an optimistic read-modify-write loop
    /// over [`EntityStore::find_by_id`] and [`EntityStore::save`]. Stores
    /// with an atomic append primitive override it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EntityNotFound`] for unknown entities and
    /// [`GatewayError::PersistenceError`] when every attempt conflicted.
    async fn append_interaction(
        &self,
        id: EntityId,
        kind: InteractionKind,
        event: TrackingEvent,
    ) -> Result<u64, GatewayError> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let Some(mut entity) = self.find_by_id(id).await? else {
                return Err(GatewayError::EntityNotFound(id));
            };
            let expected_version = entity.version;
            let count = entity.append(kind, event.clone());
            match self.save(&entity, expected_version).await {
                Ok(_) => return Ok(count),
                Err(GatewayError::VersionConflict(_)) => {
                    tracing::debug!(entity_id = %id, attempt, "append lost a version race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(GatewayError::PersistenceError(format!(
            "gave up appending {kind} to {id} after {MAX_APPEND_ATTEMPTS} conflicting attempts"
        )))
    }

    /// Returns one page of summaries (newest first) and the total count.
    ///
    /// # Errors
    ///
    /// Returns a store error on failure.
    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<EntitySummary>, u64), GatewayError>;

    /// Computes marketplace-wide totals and the `top_n` most viewed entities.
    ///
    /// # Errors
    ///
    /// Returns a store error on failure.
    async fn stats(&self, top_n: usize) -> Result<MarketplaceStats, GatewayError>;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::memory::InMemoryStore;
    use super::*;

    /// Store without an atomic append that injects conflicts on the first
    /// `conflicts` saves.
    #[derive(Debug)]
    struct ConflictingStore {
        inner: InMemoryStore,
        conflicts: AtomicU32,
        saves: AtomicU32,
    }

    impl ConflictingStore {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: InMemoryStore::new(),
                conflicts: AtomicU32::new(conflicts),
                saves: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EntityStore for ConflictingStore {
        async fn insert(&self, entity: TrackedEntity) -> Result<EntityId, GatewayError> {
            self.inner.insert(entity).await
        }

        async fn find_by_id(&self, id: EntityId) -> Result<Option<TrackedEntity>, GatewayError> {
            self.inner.find_by_id(id).await
        }

        async fn save(
            &self,
            entity: &TrackedEntity,
            expected_version: u64,
        ) -> Result<u64, GatewayError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(GatewayError::VersionConflict(entity.id));
            }
            self.inner.save(entity, expected_version).await
        }

        async fn list(
            &self,
            offset: usize,
            limit: usize,
        ) -> Result<(Vec<EntitySummary>, u64), GatewayError> {
            self.inner.list(offset, limit).await
        }

        async fn stats(&self, top_n: usize) -> Result<MarketplaceStats, GatewayError> {
            self.inner.stats(top_n).await
        }
    }

    #[tokio::test]
    async fn optimistic_append_retries_after_conflict() {
        let store = ConflictingStore::new(2);
        let entity = TrackedEntity::new("seller", "Van", "cars");
        let Ok(id) = store.insert(entity).await else {
            panic!("insert failed");
        };

        let event = TrackingEvent::new("anonymous", "curl", "127.0.0.1");
        let result = store.append_interaction(id, InteractionKind::Click, event).await;
        assert!(matches!(result, Ok(1)));
        assert_eq!(store.saves.load(Ordering::SeqCst), 3);

        let Ok(Some(stored)) = store.find_by_id(id).await else {
            panic!("entity missing");
        };
        assert_eq!(stored.click_count, 1);
        assert_eq!(stored.clicks.len(), 1);
    }

    #[tokio::test]
    async fn optimistic_append_gives_up_after_limit() {
        let store = ConflictingStore::new(MAX_APPEND_ATTEMPTS);
        let Ok(id) = store.insert(TrackedEntity::new("s", "t", "c")).await else {
            panic!("insert failed");
        };

        let event = TrackingEvent::new("u1", "curl", "127.0.0.1");
        let result = store.append_interaction(id, InteractionKind::View, event).await;
        assert!(matches!(result, Err(GatewayError::PersistenceError(_))));

        let Ok(Some(stored)) = store.find_by_id(id).await else {
            panic!("entity missing");
        };
        assert!(stored.views.is_empty());
        assert_eq!(stored.view_count, 0);
    }

    #[tokio::test]
    async fn optimistic_append_unknown_entity_is_not_found() {
        let store = ConflictingStore::new(0);
        let id = EntityId::new();
        let event = TrackingEvent::new("u1", "curl", "127.0.0.1");
        let result = store.append_interaction(id, InteractionKind::View, event).await;
        assert!(matches!(result, Err(GatewayError::EntityNotFound(missing)) if missing == id));
    }
}
