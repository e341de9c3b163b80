//! Dispatch API Handler
//!
//! The gateway endpoint external callers use to route a print request to a
//! connected agent.

use axum::{Json, extract::State};

use inkfleet_core::dto::dispatch::{DispatchAck, DispatchRequest};

use crate::api::error::{ApiError, ApiResult};
use crate::service::dispatch_service;
use crate::state::AppState;

/// POST /print/dispatch
/// Route a print request to its target agent
pub async fn dispatch_print(
    State(state): State<AppState>,
    Json(req): Json<DispatchRequest>,
) -> ApiResult<Json<DispatchAck>> {
    tracing::info!(
        "Dispatch request: agent={} printer={}",
        req.agent_id,
        req.printer_name
    );

    let ack = dispatch_service::dispatch_print(&state, req)
        .await
        .map_err(|e| match e {
            dispatch_service::DispatchError::ValidationError(msg) => ApiError::BadRequest(msg),
            dispatch_service::DispatchError::AgentNotFound(id) => {
                ApiError::NotFound(format!("Agent {} not found", id))
            }
            dispatch_service::DispatchError::AgentOffline(id) => ApiError::AgentOffline(id),
            dispatch_service::DispatchError::ConnectionLost(id) => {
                ApiError::AgentOffline(id)
            }
        })?;

    Ok(Json(ack))
}
