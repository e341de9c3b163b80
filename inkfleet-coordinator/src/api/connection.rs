//! Connection API Handlers
//!
//! Long-poll drain of an agent's dispatch mailbox. This is the delivery
//! edge of the "live connection": the agent holds a GET open and either
//! receives the next dispatch envelope, a 204 when the wait elapses, or a
//! 410 once its connection has been superseded or closed.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Default and maximum long-poll wait.
const DEFAULT_WAIT_MS: u64 = 20_000;
const MAX_WAIT_MS: u64 = 30_000;

#[derive(Debug, Deserialize)]
pub struct NextDispatchParams {
    pub wait_ms: Option<u64>,
}

/// GET /connection/{id}/next
/// Wait for the next dispatch envelope on a live connection
pub async fn next_dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<NextDispatchParams>,
) -> ApiResult<Response> {
    let wait = Duration::from_millis(params.wait_ms.unwrap_or(DEFAULT_WAIT_MS).min(MAX_WAIT_MS));

    match state.connections.next(&id, wait).await {
        Ok(Some(dispatch)) => Ok(Json(dispatch).into_response()),
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(_) => Err(ApiError::ConnectionGone(id)),
    }
}
