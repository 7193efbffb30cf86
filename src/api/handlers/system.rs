//! System endpoints: health check.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process can answer.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
    /// Open admin live-feed connections.
    pub feed_subscribers: usize,
}

/// `GET /health`: Liveness plus live-feed connection count.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        feed_subscribers: state.event_bus.receiver_count(),
    })
}

/// Root-level routes (not under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
