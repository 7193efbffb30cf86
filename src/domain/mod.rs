//! Domain layer: identifiers, user records, tracking logs, and events.
//!
//! This module holds the server-side model: entity identity, tracked
//! entities with their interaction logs, date bucketing for analytics, the
//! generic TTL cache shared by the server and the status poller, and the
//! event bus feeding the live interaction stream.

pub mod buckets;
pub mod domain_event;
pub mod entity_id;
pub mod event_bus;
pub mod tracking;
pub mod ttl_cache;
pub mod user;

pub use buckets::{DateBucket, bucketize};
pub use domain_event::DomainEvent;
pub use entity_id::EntityId;
pub use event_bus::EventBus;
pub use tracking::{
    ANONYMOUS_ACTOR, EntitySummary, InteractionKind, MarketplaceStats, TrackedEntity,
    TrackingEvent,
};
pub use ttl_cache::{CacheEntry, TtlCache};
pub use user::{UserRecord, UserRole};
