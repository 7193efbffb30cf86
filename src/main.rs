//! marketplace-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use marketplace_gateway::api;
use marketplace_gateway::app_state::AppState;
use marketplace_gateway::config::GatewayConfig;
use marketplace_gateway::domain::{EventBus, UserRecord, UserRole};
use marketplace_gateway::identity::HeaderIdentity;
use marketplace_gateway::persistence::memory::InMemoryStore;
use marketplace_gateway::persistence::postgres::PostgresStore;
use marketplace_gateway::persistence::{EntityStore, UserStore};
use marketplace_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting marketplace-gateway");

    let (users, entities): (Arc<dyn UserStore>, Arc<dyn EntityStore>) =
        if config.persistence_enabled {
            let store = Arc::new(
                PostgresStore::connect(&config)
                    .await
                    .context("failed to connect to PostgreSQL")?,
            );
            tracing::info!("using PostgreSQL store");
            (Arc::clone(&store) as Arc<dyn UserStore>, store)
        } else {
            let store = Arc::new(InMemoryStore::with_users(
                config
                    .seed_admins
                    .iter()
                    .map(|id| UserRecord::new(id.as_str(), UserRole::Admin)),
            ));
            tracing::warn!(
                seeded_admins = config.seed_admins.len(),
                "persistence disabled, using in-memory store"
            );
            (Arc::clone(&store) as Arc<dyn UserStore>, store)
        };

    let role_cache_ttl = chrono::Duration::seconds(
        i64::try_from(config.role_cache_ttl_secs).context("ROLE_CACHE_TTL_SECS out of range")?,
    );
    let app_state = AppState::new(
        users,
        entities,
        Arc::new(HeaderIdentity::new(&config.identity_header)),
        role_cache_ttl,
        EventBus::new(config.event_bus_capacity),
    );

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
