//! Admin endpoints: caller status, entity listing, and aggregate stats.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    AdminStatusQuery, AdminStatusResponse, EntityListResponse, PaginationParams, UserDetailsDto,
};
use crate::app_state::AppState;
use crate::domain::MarketplaceStats;
use crate::error::{ErrorResponse, GatewayError};
use crate::identity::CallerIdentity;

/// `GET /admin/status`: Whether the caller is an administrator.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] without a caller identity and
/// [`GatewayError::StoreUnavailable`] if the role cannot be determined.
#[utoipa::path(
    get,
    path = "/api/v1/admin/status",
    tag = "Admin",
    summary = "Caller admin status",
    description = "Resolves the caller's admin role through the role cache. `refresh=true` bypasses the cache.",
    params(AdminStatusQuery),
    responses(
        (status = 200, description = "Caller status", body = AdminStatusResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 500, description = "User store unavailable", body = ErrorResponse),
    )
)]
pub async fn admin_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<AdminStatusQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let Some(user) = caller.0 else {
        return Err(GatewayError::Unauthenticated);
    };

    let (is_admin, record) = state
        .role_cache
        .lookup_profile(&user, query.refresh)
        .await?;
    let user_details = record.map(UserDetailsDto::from);

    Ok(Json(AdminStatusResponse {
        is_admin,
        user_details,
    }))
}

/// `GET /admin/entities`: Paginated listing of all advertisements.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] / [`GatewayError::Forbidden`]
/// for non-admins, or a store error.
#[utoipa::path(
    get,
    path = "/api/v1/admin/entities",
    tag = "Admin",
    summary = "List advertisements",
    description = "Returns a paginated list of advertisement summaries with counters, newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated entity list", body = EntityListResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
    )
)]
pub async fn list_entities(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    state.guard.require_admin(caller.as_deref()).await?;

    let params = params.clamped();
    let (data, total) = state
        .entities
        .list(params.offset(), params.per_page as usize)
        .await?;

    Ok(Json(EntityListResponse {
        data,
        pagination: params.meta(total),
    }))
}

/// `GET /admin/stats`: Marketplace-wide interaction totals.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] / [`GatewayError::Forbidden`]
/// for non-admins, or a store error.
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    summary = "Aggregate statistics",
    description = "Totals of entities, clicks and views plus the most viewed advertisements.",
    responses(
        (status = 200, description = "Aggregate statistics", body = MarketplaceStats),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    state.guard.require_admin(caller.as_deref()).await?;
    Ok(Json(state.entities.stats().await?))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(admin_status))
        .route("/admin/entities", get(list_entities))
        .route("/admin/stats", get(stats))
}
