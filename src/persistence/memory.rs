//! In-memory store with per-entity fine-grained locking.
//!
//! [`InMemoryStore`] keeps users in a `HashMap` and entities in a
//! `HashMap` where each entry is individually protected by a
//! [`tokio::sync::RwLock`]. Appends to the same entity are serialized by
//! the entry lock, which makes `append_interaction` atomic; appends to
//! different entities run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EntityStore, UserStore};
use crate::domain::{
    EntityId, EntitySummary, InteractionKind, MarketplaceStats, TrackedEntity, TrackingEvent,
    UserRecord,
};
use crate::error::GatewayError;

/// Process-local user and entity store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
    entities: RwLock<HashMap<EntityId, Arc<RwLock<TrackedEntity>>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given user records.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let map = users
            .into_iter()
            .map(|user| (user.identifier.clone(), user))
            .collect();
        Self {
            users: RwLock::new(map),
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces a user record.
    pub async fn upsert_user(&self, user: UserRecord) {
        self.users
            .write()
            .await
            .insert(user.identifier.clone(), user);
    }

    async fn entry(&self, id: EntityId) -> Option<Arc<RwLock<TrackedEntity>>> {
        self.entities.read().await.get(&id).cloned()
    }

    async fn snapshot_summaries(&self) -> Vec<EntitySummary> {
        let map = self.entities.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry in map.values() {
            summaries.push(EntitySummary::from(&*entry.read().await));
        }
        summaries
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, GatewayError> {
        Ok(self.users.read().await.get(identifier).cloned())
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn insert(&self, mut entity: TrackedEntity) -> Result<EntityId, GatewayError> {
        let id = entity.id;
        let mut map = self.entities.write().await;
        if map.contains_key(&id) {
            return Err(GatewayError::InvalidRequest(format!(
                "entity {id} already exists"
            )));
        }
        entity.recount();
        map.insert(id, Arc::new(RwLock::new(entity)));
        Ok(id)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<TrackedEntity>, GatewayError> {
        let Some(entry) = self.entry(id).await else {
            return Ok(None);
        };
        let entity = entry.read().await.clone();
        Ok(Some(entity))
    }

    async fn save(
        &self,
        entity: &TrackedEntity,
        expected_version: u64,
    ) -> Result<u64, GatewayError> {
        let entry = self
            .entry(entity.id)
            .await
            .ok_or(GatewayError::EntityNotFound(entity.id))?;
        let mut stored = entry.write().await;
        if stored.version != expected_version {
            return Err(GatewayError::VersionConflict(entity.id));
        }
        let mut replacement = entity.clone();
        replacement.recount();
        replacement.version = expected_version.saturating_add(1);
        *stored = replacement;
        Ok(stored.version)
    }

    async fn append_interaction(
        &self,
        id: EntityId,
        kind: InteractionKind,
        event: TrackingEvent,
    ) -> Result<u64, GatewayError> {
        let entry = self
            .entry(id)
            .await
            .ok_or(GatewayError::EntityNotFound(id))?;
        let mut entity = entry.write().await;
        let count = entity.append(kind, event);
        entity.version = entity.version.saturating_add(1);
        Ok(count)
    }

    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<EntitySummary>, u64), GatewayError> {
        let mut summaries = self.snapshot_summaries().await;
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        let total = summaries.len() as u64;
        let page = summaries.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn stats(&self, top_n: usize) -> Result<MarketplaceStats, GatewayError> {
        let mut summaries = self.snapshot_summaries().await;
        let total_entities = summaries.len() as u64;
        let total_clicks = summaries.iter().map(|s| s.click_count).sum();
        let total_views = summaries.iter().map(|s| s.view_count).sum();
        summaries.sort_by(|a, b| {
            b.view_count
                .cmp(&a.view_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        summaries.truncate(top_n);
        Ok(MarketplaceStats {
            total_entities,
            total_clicks,
            total_views,
            top_viewed: summaries,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    fn event(actor: &str) -> TrackingEvent {
        TrackingEvent::new(actor, "test-agent", "10.1.1.1")
    }

    #[tokio::test]
    async fn find_user_returns_none_for_unknown() {
        let store = InMemoryStore::with_users([UserRecord::new("u1", UserRole::Admin)]);
        let Ok(found) = store.find_by_identifier("u1").await else {
            panic!("lookup failed");
        };
        assert!(found.is_some_and(|u| u.is_admin()));
        assert!(matches!(store.find_by_identifier("ghost").await, Ok(None)));
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryStore::new();
        let entity = TrackedEntity::new("seller", "Sedan", "cars");
        let id = entity.id;
        assert!(store.insert(entity).await.is_ok());
        assert!(matches!(store.find_by_id(id).await, Ok(Some(e)) if e.title == "Sedan"));
        assert!(matches!(store.find_by_id(EntityId::new()).await, Ok(None)));
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryStore::new();
        let entity = TrackedEntity::new("seller", "Sedan", "cars");
        let copy = entity.clone();
        assert!(store.insert(entity).await.is_ok());
        assert!(matches!(
            store.insert(copy).await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn append_keeps_counters_in_sync() {
        let store = InMemoryStore::new();
        let Ok(id) = store.insert(TrackedEntity::new("s", "t", "c")).await else {
            panic!("insert failed");
        };
        for (expected, actor) in [(1, "anonymous"), (2, "u1"), (3, "anonymous")] {
            let Ok(count) = store
                .append_interaction(id, InteractionKind::Click, event(actor))
                .await
            else {
                panic!("append failed");
            };
            assert_eq!(count, expected);
        }
        let Ok(Some(entity)) = store.find_by_id(id).await else {
            panic!("entity missing");
        };
        assert_eq!(entity.click_count, 3);
        assert_eq!(entity.clicks.len(), 3);
        assert_eq!(entity.version, 3);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryStore::new());
        let Ok(id) = store.insert(TrackedEntity::new("s", "t", "c")).await else {
            panic!("insert failed");
        };
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_interaction(id, InteractionKind::View, event(&format!("u{i}")))
                    .await
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await, Ok(Ok(_))));
        }
        let Ok(Some(entity)) = store.find_by_id(id).await else {
            panic!("entity missing");
        };
        assert_eq!(entity.view_count, 32);
        assert_eq!(entity.views.len(), 32);
    }

    #[tokio::test]
    async fn save_detects_stale_version() {
        let store = InMemoryStore::new();
        let Ok(id) = store.insert(TrackedEntity::new("s", "t", "c")).await else {
            panic!("insert failed");
        };
        let Ok(Some(mut copy)) = store.find_by_id(id).await else {
            panic!("entity missing");
        };
        assert!(store
            .append_interaction(id, InteractionKind::View, event("u1"))
            .await
            .is_ok());

        copy.title = "renamed".to_string();
        assert!(matches!(
            store.save(&copy, 0).await,
            Err(GatewayError::VersionConflict(_))
        ));
        assert!(matches!(store.save(&copy, 1).await, Ok(2)));
    }

    #[tokio::test]
    async fn list_paginates_and_counts() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            let _ = store
                .insert(TrackedEntity::new("s", format!("ad {i}"), "cars"))
                .await;
        }
        let Ok((page, total)) = store.list(2, 2).await else {
            panic!("list failed");
        };
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn stats_sum_counters_and_rank_by_views() {
        let store = InMemoryStore::new();
        let Ok(quiet) = store.insert(TrackedEntity::new("s", "quiet", "c")).await else {
            panic!("insert failed");
        };
        let Ok(busy) = store.insert(TrackedEntity::new("s", "busy", "c")).await else {
            panic!("insert failed");
        };
        for _ in 0..3 {
            let _ = store
                .append_interaction(busy, InteractionKind::View, event("anonymous"))
                .await;
        }
        let _ = store
            .append_interaction(quiet, InteractionKind::Click, event("u1"))
            .await;

        let Ok(stats) = store.stats(1).await else {
            panic!("stats failed");
        };
        assert_eq!(stats.total_entities, 2);
        assert_eq!(stats.total_views, 3);
        assert_eq!(stats.total_clicks, 1);
        assert_eq!(stats.top_viewed.len(), 1);
        assert!(stats.top_viewed.first().is_some_and(|s| s.id == busy));
    }
}
