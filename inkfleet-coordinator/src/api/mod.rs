//! API Module
//!
//! HTTP API layer for the coordinator.
//! Each submodule handles endpoints for a specific domain.

pub mod agent;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod health;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Agent registration & presence
        .route("/agent/register", post(agent::register_agent))
        .route("/agent/list", get(agent::list_agents))
        .route("/agent/watch", get(agent::watch_agents))
        .route("/agent/{id}", get(agent::get_agent))
        .route("/agent/{id}", delete(agent::unregister_agent))
        .route("/agent/{id}/heartbeat", post(agent::agent_heartbeat))
        .route("/agent/{id}/printers", post(agent::report_printers))
        .route("/agent/{id}/info", post(agent::update_agent_info))
        // Live-connection drain
        .route("/connection/{id}/next", get(connection::next_dispatch))
        // Dispatch gateway
        .route("/print/dispatch", post(dispatch::dispatch_print))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
