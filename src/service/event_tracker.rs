//! Interaction tracking: click/view recording and analytics.
//!
//! [`EventTracker`] appends [`TrackingEvent`]s through the
//! [`EntityStore`]'s atomic append and publishes a
//! [`DomainEvent::InteractionRecorded`] once the write has succeeded.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    DateBucket, DomainEvent, EntityId, EventBus, InteractionKind, TrackedEntity, TrackingEvent,
    bucketize,
};
use crate::error::GatewayError;
use crate::persistence::EntityStore;

/// Counters and per-day series for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EntityAnalytics {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Total clicks.
    pub click_count: u64,
    /// Total views.
    pub view_count: u64,
    /// Clicks grouped by UTC date, first-seen order.
    pub clicks_over_time: Vec<DateBucket>,
    /// Views grouped by UTC date, first-seen order.
    pub views_over_time: Vec<DateBucket>,
}

impl From<&TrackedEntity> for EntityAnalytics {
    fn from(entity: &TrackedEntity) -> Self {
        Self {
            entity_id: entity.id,
            click_count: entity.click_count,
            view_count: entity.view_count,
            clicks_over_time: bucketize(&entity.clicks),
            views_over_time: bucketize(&entity.views),
        }
    }
}

/// Records clicks and views against tracked entities.
///
/// Each call appends a new event; repeated calls with the same arguments
/// are not de-duplicated.
#[derive(Debug, Clone)]
pub struct EventTracker {
    store: Arc<dyn EntityStore>,
    event_bus: EventBus,
}

impl EventTracker {
    /// Creates a tracker writing to `store` and publishing on `event_bus`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Records an interaction stamped with the current time and returns the
    /// updated counter for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EntityNotFound`] for unknown entities and a
    /// store error when the append could not be persisted.
    pub async fn record(
        &self,
        entity_id: EntityId,
        kind: InteractionKind,
        actor_id: &str,
        device_label: &str,
        source_address: &str,
    ) -> Result<u64, GatewayError> {
        let event = TrackingEvent::new(actor_id, device_label, source_address);
        self.record_event(entity_id, kind, event).await
    }

    /// Records a fully formed event.
    ///
    /// # Errors
    ///
    /// Same as [`EventTracker::record`].
    pub async fn record_event(
        &self,
        entity_id: EntityId,
        kind: InteractionKind,
        event: TrackingEvent,
    ) -> Result<u64, GatewayError> {
        let actor_id = event.actor_id.clone();
        let updated_count = self
            .store
            .append_interaction(entity_id, kind, event)
            .await
            .inspect_err(|e| {
                tracing::warn!(%entity_id, %kind, error = %e, "failed to record interaction");
            })?;

        let _ = self.event_bus.publish(DomainEvent::InteractionRecorded {
            entity_id,
            kind,
            updated_count,
            actor_id,
            timestamp: Utc::now(),
        });

        tracing::debug!(%entity_id, %kind, updated_count, "interaction recorded");
        Ok(updated_count)
    }

    /// Loads an entity and computes its analytics.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EntityNotFound`] for unknown entities or a
    /// store error on failure.
    pub async fn analytics(&self, entity_id: EntityId) -> Result<EntityAnalytics, GatewayError> {
        let entity = self
            .store
            .find_by_id(entity_id)
            .await?
            .ok_or(GatewayError::EntityNotFound(entity_id))?;
        Ok(EntityAnalytics::from(&entity))
    }
}
