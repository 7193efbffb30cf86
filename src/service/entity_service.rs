//! Advertisement lifecycle: publish, fetch, list, and aggregate stats.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    DomainEvent, EntityId, EntitySummary, EventBus, MarketplaceStats, TrackedEntity,
};
use crate::error::GatewayError;
use crate::persistence::EntityStore;

/// Number of entries in the "most viewed" list of the admin stats.
pub const TOP_VIEWED_LIMIT: usize = 5;

/// Orchestrates entity reads and writes and emits events.
#[derive(Debug, Clone)]
pub struct EntityService {
    store: Arc<dyn EntityStore>,
    event_bus: EventBus,
}

impl EntityService {
    /// Creates a new `EntityService`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Publishes a new advertisement owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank title or
    /// category, or a store error on failure.
    pub async fn create(
        &self,
        owner_id: &str,
        title: &str,
        category: &str,
    ) -> Result<TrackedEntity, GatewayError> {
        let title = title.trim();
        let category = category.trim();
        if title.is_empty() {
            return Err(GatewayError::InvalidRequest("title must not be empty".to_string()));
        }
        if category.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "category must not be empty".to_string(),
            ));
        }

        let entity = TrackedEntity::new(owner_id, title, category);
        let entity_id = self.store.insert(entity.clone()).await?;

        let _ = self.event_bus.publish(DomainEvent::EntityCreated {
            entity_id,
            owner_id: owner_id.to_string(),
            category: entity.category.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(%entity_id, owner = owner_id, "entity created");
        Ok(entity)
    }

    /// Loads an entity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EntityNotFound`] if it does not exist.
    pub async fn get(&self, entity_id: EntityId) -> Result<TrackedEntity, GatewayError> {
        self.store
            .find_by_id(entity_id)
            .await?
            .ok_or(GatewayError::EntityNotFound(entity_id))
    }

    /// Returns one page of summaries and the total entity count.
    ///
    /// # Errors
    ///
    /// Returns a store error on failure.
    pub async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<EntitySummary>, u64), GatewayError> {
        self.store.list(offset, limit).await
    }

    /// Returns marketplace-wide totals.
    ///
    /// # Errors
    ///
    /// Returns a store error on failure.
    pub async fn stats(&self) -> Result<MarketplaceStats, GatewayError> {
        self.store.stats(TOP_VIEWED_LIMIT).await
    }
}
