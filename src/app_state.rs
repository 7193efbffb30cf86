//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::EventBus;
use crate::identity::IdentityProvider;
use crate::persistence::{EntityStore, UserStore};
use crate::service::{AccessGuard, EntityService, EventTracker, RoleCache};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server-side role cache.
    pub role_cache: Arc<RoleCache>,
    /// Admin gate built over `role_cache`.
    pub guard: AccessGuard,
    /// Click/view recording and analytics.
    pub tracker: Arc<EventTracker>,
    /// Advertisement lifecycle operations.
    pub entities: Arc<EntityService>,
    /// Caller identity resolution.
    pub identity: Arc<dyn IdentityProvider>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the service layer over the given collaborators.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        entity_store: Arc<dyn EntityStore>,
        identity: Arc<dyn IdentityProvider>,
        role_cache_ttl: Duration,
        event_bus: EventBus,
    ) -> Self {
        let role_cache = Arc::new(RoleCache::new(users, role_cache_ttl));
        let guard = AccessGuard::new(Arc::clone(&role_cache));
        let tracker = Arc::new(EventTracker::new(
            Arc::clone(&entity_store),
            event_bus.clone(),
        ));
        let entities = Arc::new(EntityService::new(entity_store, event_bus.clone()));
        Self {
            role_cache,
            guard,
            tracker,
            entities,
            identity,
            event_bus,
        }
    }
}
