//! Advertisement DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /entities`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEntityRequest {
    /// Listing title.
    pub title: String,
    /// Listing category (e.g. `"cars"`, `"houses"`).
    pub category: String,
}
