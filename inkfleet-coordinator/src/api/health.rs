//! Health API Handler
//!
//! Liveness endpoint for load balancers and container probes.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
/// Reports coordinator liveness
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
