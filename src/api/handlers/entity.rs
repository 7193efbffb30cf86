//! Advertisement handlers: publish and fetch.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::CreateEntityRequest;
use crate::app_state::AppState;
use crate::domain::{EntityId, EntitySummary};
use crate::error::{ErrorResponse, GatewayError};
use crate::identity::CallerIdentity;

/// `POST /entities`: Publish a new advertisement owned by the caller.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] without a caller identity and
/// [`GatewayError::InvalidRequest`] for blank fields.
#[utoipa::path(
    post,
    path = "/api/v1/entities",
    tag = "Entities",
    summary = "Publish an advertisement",
    description = "Creates an advertisement with empty click and view logs, owned by the caller.",
    request_body = CreateEntityRequest,
    responses(
        (status = 201, description = "Advertisement created", body = EntitySummary),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
    )
)]
pub async fn create_entity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(req): Json<CreateEntityRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let Some(owner) = caller.0 else {
        return Err(GatewayError::Unauthenticated);
    };
    let entity = state
        .entities
        .create(&owner, &req.title, &req.category)
        .await?;
    Ok((StatusCode::CREATED, Json(EntitySummary::from(&entity))))
}

/// `GET /entities/{id}`: Public advertisement summary with counters.
///
/// # Errors
///
/// Returns [`GatewayError::EntityNotFound`] if the entity does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/entities/{id}",
    tag = "Entities",
    summary = "Get an advertisement",
    params(
        ("id" = uuid::Uuid, Path, description = "Entity UUID"),
    ),
    responses(
        (status = 200, description = "Advertisement summary", body = EntitySummary),
        (status = 404, description = "Entity not found", body = ErrorResponse),
    )
)]
pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let entity = state.entities.get(EntityId::from_uuid(id)).await?;
    Ok(Json(EntitySummary::from(&entity)))
}

/// Entity routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entities", post(create_entity))
        .route("/entities/{id}", get(get_entity))
}
