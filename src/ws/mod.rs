//! WebSocket layer: the admin live interaction feed.
//!
//! The endpoint at `/ws` streams [`crate::domain::DomainEvent`]s for the
//! entities a connected admin has subscribed to, and answers analytics
//! queries over the same socket.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
