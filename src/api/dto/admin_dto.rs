//! Admin status and dashboard DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{EntitySummary, UserRecord, UserRole};

/// Query parameters for `GET /admin/status`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminStatusQuery {
    /// Bypass the role cache and re-query the user store.
    #[serde(default)]
    pub refresh: bool,
}

/// Profile details of the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetailsDto {
    /// User identifier.
    pub identifier: String,
    /// Stored role.
    pub role: UserRole,
    /// Display name, if known.
    pub display_name: Option<String>,
    /// Email, if known.
    pub email: Option<String>,
}

impl From<UserRecord> for UserDetailsDto {
    fn from(record: UserRecord) -> Self {
        Self {
            identifier: record.identifier,
            role: record.role,
            display_name: record.display_name,
            email: record.email,
        }
    }
}

/// Response body for `GET /admin/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminStatusResponse {
    /// Whether the caller holds the admin role.
    pub is_admin: bool,
    /// Caller profile, `None` when the user store has no record.
    pub user_details: Option<UserDetailsDto>,
}

/// Paginated list response for `GET /admin/entities`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntityListResponse {
    /// Entity summaries.
    pub data: Vec<EntitySummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
