//! Per-connection subscription filter.
//!
//! Tracks which entities an admin feed connection follows.

use std::collections::HashSet;

use crate::domain::EntityId;

/// Entity subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    entity_ids: HashSet<EntityId>,
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates an empty subscription set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entity IDs; `wildcard` follows every entity.
    pub fn subscribe(&mut self, ids: &[EntityId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.entity_ids.extend(ids.iter().copied());
    }

    /// Removes entity IDs; `wildcard` turns the wildcard off.
    pub fn unsubscribe(&mut self, ids: &[EntityId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.entity_ids.remove(id);
        }
    }

    /// Returns `true` if events for `entity_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, entity_id: EntityId) -> bool {
        self.subscribe_all || self.entity_ids.contains(&entity_id)
    }

    /// Number of explicitly followed entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entity_ids.len()
    }

    /// Returns `true` if the wildcard is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
