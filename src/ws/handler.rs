//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::GatewayError;
use crate::identity::CallerIdentity;

/// `GET /ws`: upgrades an admin connection to the live interaction feed.
///
/// The admin check runs before the upgrade so non-admins get a plain
/// 401/403 JSON error instead of a socket.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] or [`GatewayError::Forbidden`]
/// when the caller is not an administrator.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, GatewayError> {
    let admin = state.guard.require_admin(caller.as_deref()).await?;
    tracing::info!(user = %admin, "admin feed connected");

    let event_rx = state.event_bus.subscribe();
    let tracker = Arc::clone(&state.tracker);
    Ok(ws.on_upgrade(move |socket| run_connection(socket, event_rx, tracker)))
}
