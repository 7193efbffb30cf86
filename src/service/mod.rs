//! Service layer: business logic orchestration.
//!
//! [`RoleCache`] and [`AccessGuard`] decide who may do what,
//! [`EventTracker`] records interactions, and [`EntityService`] manages
//! the advertisements themselves.

pub mod access_guard;
pub mod entity_service;
pub mod event_tracker;
pub mod role_cache;

pub use access_guard::{AccessGuard, Verdict};
pub use entity_service::EntityService;
pub use event_tracker::{EntityAnalytics, EventTracker};
pub use role_cache::RoleCache;
