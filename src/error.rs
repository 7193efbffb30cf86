//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EntityId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "forbidden: not an administrator",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                   |
/// |-----------|---------------------|-------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request               |
/// | 2000–2999 | Access / Not Found  | 401 / 403 / 404 / 409         |
/// | 3000–3999 | Server / Store      | 500 Internal Server Error     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown or malformed interaction kind.
    #[error("invalid interaction: {0}")]
    InvalidInteraction(String),

    /// No caller identity was available.
    #[error("authentication required")]
    Unauthenticated,

    /// Caller identity present but lacking the required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Tracked entity with the given ID was not found.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A versioned write lost against a concurrent writer.
    #[error("version conflict on entity {0}")]
    VersionConflict(EntityId),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidInteraction(_) => 1002,
            Self::Unauthenticated => 2001,
            Self::Forbidden(_) => 2002,
            Self::EntityNotFound(_) => 2003,
            Self::VersionConflict(_) => 2004,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable(_) => 3001,
            Self::PersistenceError(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidInteraction(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::EntityNotFound(_) => StatusCode::NOT_FOUND,
            Self::VersionConflict(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for failures the caller may retry later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::PersistenceError(_) | Self::VersionConflict(_)
        )
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::PersistenceError(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_errors_map_to_distinct_statuses() {
        assert_eq!(
            GatewayError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::Forbidden("no".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::EntityNotFound(EntityId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_failures_are_transient_server_errors() {
        let err = GatewayError::StoreUnavailable("down".to_string());
        assert!(err.is_transient());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!GatewayError::Unauthenticated.is_transient());
    }

    #[test]
    fn pool_timeout_maps_to_store_unavailable() {
        let err = GatewayError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, GatewayError::StoreUnavailable(_)));
        assert_eq!(err.error_code(), 3001);
    }

    #[test]
    fn response_carries_status() {
        let response = GatewayError::Forbidden("not an administrator".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
