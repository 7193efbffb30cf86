//! Interaction recording and analytics handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{RecordInteractionRequest, RecordInteractionResponse};
use crate::app_state::AppState;
use crate::domain::{ANONYMOUS_ACTOR, EntityId, InteractionKind};
use crate::error::{ErrorResponse, GatewayError};
use crate::identity::CallerIdentity;
use crate::service::EntityAnalytics;

/// Placeholder for request metadata that could not be determined.
const UNKNOWN: &str = "unknown";

/// `POST /entities/{id}/interactions`: Record a click or view.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInteraction`] for an unknown kind,
/// [`GatewayError::EntityNotFound`] for an unknown entity, or a store
/// error when the append could not be persisted.
#[utoipa::path(
    post,
    path = "/api/v1/entities/{id}/interactions",
    tag = "Tracking",
    summary = "Record an interaction",
    description = "Appends a click or view to the entity's log and returns the re-derived counter. Not idempotent.",
    params(
        ("id" = uuid::Uuid, Path, description = "Entity UUID"),
    ),
    request_body = RecordInteractionRequest,
    responses(
        (status = 200, description = "Interaction recorded", body = RecordInteractionResponse),
        (status = 400, description = "Unknown interaction kind", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 500, description = "Interaction not persisted", body = ErrorResponse),
    )
)]
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    caller: CallerIdentity,
    headers: HeaderMap,
    Json(req): Json<RecordInteractionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let entity_id = EntityId::from_uuid(id);
    let kind: InteractionKind = req
        .kind
        .parse()
        .map_err(GatewayError::InvalidInteraction)?;

    let actor_id = req
        .actor_id
        .or(caller.0)
        .unwrap_or_else(|| ANONYMOUS_ACTOR.to_string());
    let device_label = req
        .device_label
        .or_else(|| header_str(&headers, USER_AGENT.as_str()))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let source_address = req
        .source_address
        .or_else(|| forwarded_for(&headers))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let updated_count = state
        .tracker
        .record(entity_id, kind, &actor_id, &device_label, &source_address)
        .await?;

    Ok(Json(RecordInteractionResponse {
        entity_id,
        kind,
        updated_count,
    }))
}

/// `GET /entities/{id}/analytics`: Counters and per-day series.
///
/// Only the entity owner or an administrator may read analytics.
///
/// # Errors
///
/// Returns [`GatewayError::EntityNotFound`] for an unknown entity and
/// [`GatewayError::Unauthenticated`] / [`GatewayError::Forbidden`] when
/// the caller is neither owner nor admin.
#[utoipa::path(
    get,
    path = "/api/v1/entities/{id}/analytics",
    tag = "Tracking",
    summary = "Entity analytics",
    description = "Returns click and view counters plus events grouped by UTC date in first-seen order.",
    params(
        ("id" = uuid::Uuid, Path, description = "Entity UUID"),
    ),
    responses(
        (status = 200, description = "Entity analytics", body = EntityAnalytics),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 403, description = "Neither owner nor administrator", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
    )
)]
pub async fn analytics(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let entity = state.entities.get(EntityId::from_uuid(id)).await?;
    state
        .guard
        .authorize_for(&entity.owner_id, caller.as_deref())
        .await
        .into_result()?;
    Ok(Json(EntityAnalytics::from(&entity)))
}

/// Tracking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entities/{id}/interactions", post(record_interaction))
        .route("/entities/{id}/analytics", get(analytics))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First hop of `x-forwarded-for`, i.e. the original client address.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for").and_then(|v| {
        v.split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn missing_headers_yield_none() {
        let headers = HeaderMap::new();
        assert_eq!(forwarded_for(&headers), None);
        assert_eq!(header_str(&headers, "user-agent"), None);
    }
}
