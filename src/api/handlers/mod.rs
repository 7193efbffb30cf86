//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod entity;
pub mod system;
pub mod tracking;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(admin::routes())
        .merge(entity::routes())
        .merge(tracking::routes())
}
