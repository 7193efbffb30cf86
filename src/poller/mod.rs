//! Client-side admin status poller.
//!
//! Mirrors the server-side access guard from the caller's side: it keeps a
//! persisted verdict cache with its own TTL and re-validates the caller's
//! admin status on mount, on manual retry, when the surface becomes
//! visible again with a stale verdict, and on a fixed timer.
//!
//! [`StatusMachine`] holds the pure state machine; [`StatusPoller`] drives
//! it with a tokio event loop and an [`AdminStatusChecker`].

pub mod cache;
pub mod config;
pub mod driver;
pub mod machine;

pub use cache::{MemoryVerdictStorage, PersistedVerdictCache, VerdictStorage};
pub use config::PollerConfig;
pub use driver::{
    AdminStatusChecker, HttpStatusChecker, PollerError, PollerInput, PollerSnapshot, StatusPoller,
};
pub use machine::{
    CheckDecision, CheckOutcome, CheckTicket, PollTrigger, PollerState, SkipReason, StatusMachine,
};
