//! Data Transfer Objects for REST request/response serialization.

pub mod admin_dto;
pub mod common_dto;
pub mod entity_dto;
pub mod tracking_dto;

pub use admin_dto::*;
pub use common_dto::*;
pub use entity_dto::*;
pub use tracking_dto::*;
