//! # marketplace-gateway
//!
//! Admin authorization and advertisement analytics for a classifieds
//! marketplace.
//!
//! The crate covers two concerns of the marketplace backend:
//!
//! - **Admin authorization**: a TTL role cache in front of the user store
//!   and an access guard that every admin route consults. A client-side
//!   [`poller`] mirrors the guard with its own persisted cache.
//! - **Interaction tracking**: click/view events appended to each
//!   advertisement's log, with counters that always equal the log length,
//!   and per-day analytics series.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket, status poller)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Admin live feed (ws/)
//!     │
//!     ├── IdentityProvider (identity)
//!     ├── AccessGuard → RoleCache (service/)
//!     ├── EventTracker, EntityService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── UserStore / EntityStore (persistence/)
//!           ├── PostgreSQL
//!           └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod poller;
pub mod service;
pub mod ws;
