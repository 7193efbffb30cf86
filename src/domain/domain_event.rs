//! Domain events reflecting marketplace entity mutations.
//!
//! Every successful mutation emits a [`DomainEvent`] through the
//! [`super::EventBus`]. Events feed the admin live interaction feed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EntityId, InteractionKind};

/// Domain event emitted after every entity mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Emitted when a new advertisement is published.
    EntityCreated {
        /// Entity identifier.
        entity_id: EntityId,
        /// Publishing user.
        owner_id: String,
        /// Listing category.
        category: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a click or view has been durably recorded.
    InteractionRecorded {
        /// Entity identifier.
        entity_id: EntityId,
        /// Click or view.
        kind: InteractionKind,
        /// Counter value after the append.
        updated_count: u64,
        /// Interacting actor (`"anonymous"` allowed).
        actor_id: String,
        /// Recording timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the entity ID associated with this event.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        match self {
            Self::EntityCreated { entity_id, .. } | Self::InteractionRecorded { entity_id, .. } => {
                *entity_id
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EntityCreated { .. } => "entity_created",
            Self::InteractionRecorded { .. } => "interaction_recorded",
        }
    }
}
