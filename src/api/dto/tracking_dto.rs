//! Interaction recording DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EntityId, InteractionKind};

/// Request body for `POST /entities/:id/interactions`.
///
/// Missing optional fields are filled from the request: the caller
/// identity (or `"anonymous"`), the `user-agent` header, and the first
/// `x-forwarded-for` hop.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordInteractionRequest {
    /// `"click"` or `"view"`.
    pub kind: String,
    /// Explicit actor identifier.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Device description.
    #[serde(default)]
    pub device_label: Option<String>,
    /// Source network address.
    #[serde(default)]
    pub source_address: Option<String>,
}

/// Response body for `POST /entities/:id/interactions`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordInteractionResponse {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Interaction kind recorded.
    pub kind: InteractionKind,
    /// Counter value after the append.
    pub updated_count: u64,
}
