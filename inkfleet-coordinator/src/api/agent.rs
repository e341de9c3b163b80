//! Agent API Handlers
//!
//! HTTP endpoints for agent registration, presence and printer reporting.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::time::Duration;

use inkfleet_core::domain::agent::AgentRecord;
use inkfleet_core::dto::agent::{
    AgentSession, AgentSnapshot, RegisterAgent, ReportPrinters, UpdateAgentInfo,
};

use crate::api::error::{ApiError, ApiResult};
use crate::service::agent_service;
use crate::state::AppState;

fn map_error(err: agent_service::AgentError) -> ApiError {
    match err {
        agent_service::AgentError::NotFound(id) => {
            ApiError::NotFound(format!("Agent {} not found", id))
        }
        agent_service::AgentError::ValidationError(msg) => ApiError::BadRequest(msg),
    }
}

/// POST /agent/register
/// Register an agent (or refresh its registration after a reconnect)
pub async fn register_agent(
    State(state): State<AppState>,
    Json(req): Json<RegisterAgent>,
) -> ApiResult<Json<AgentSession>> {
    tracing::info!("Registering agent: {}", req.agent_id);

    let session = agent_service::register_agent(&state, req)
        .await
        .map_err(map_error)?;

    Ok(Json(session))
}

/// POST /agent/{id}/heartbeat
/// Refresh an agent's liveness
pub async fn agent_heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::debug!("Heartbeat from agent: {}", id);

    agent_service::heartbeat(&state, &id)
        .await
        .map_err(map_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /agent/{id}/printers
/// Replace an agent's printer snapshot
pub async fn report_printers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReportPrinters>,
) -> ApiResult<StatusCode> {
    tracing::debug!("Printer report from agent: {}", id);

    agent_service::report_printers(&state, &id, req.printers)
        .await
        .map_err(map_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /agent/{id}/info
/// Out-of-band update of machine name / location
pub async fn update_agent_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAgentInfo>,
) -> ApiResult<Json<AgentRecord>> {
    tracing::info!("Updating agent info: {}", id);

    let record = agent_service::update_info(&state, &id, req)
        .await
        .map_err(map_error)?;

    Ok(Json(record))
}

/// GET /agent/list
/// Current status snapshot of all agents
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<AgentSnapshot>>> {
    tracing::debug!("Listing all agents");

    let agents = agent_service::list_agents(&state).await.map_err(map_error)?;

    Ok(Json(agents))
}

/// GET /agent/{id}
/// Full record for a specific agent
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentRecord>> {
    tracing::debug!("Getting agent: {}", id);

    let record = agent_service::get_agent(&state, &id)
        .await
        .map_err(map_error)?;

    Ok(Json(record))
}

const DEFAULT_WATCH_WAIT_MS: u64 = 20_000;
const MAX_WATCH_WAIT_MS: u64 = 30_000;

#[derive(Debug, Deserialize)]
pub struct WatchParams {
    pub wait_ms: Option<u64>,
}

/// GET /agent/watch
/// Long-poll for the next presence broadcast; 204 when the wait elapses
/// without a status change.
pub async fn watch_agents(
    State(state): State<AppState>,
    Query(params): Query<WatchParams>,
) -> Response {
    let wait = Duration::from_millis(
        params
            .wait_ms
            .unwrap_or(DEFAULT_WATCH_WAIT_MS)
            .min(MAX_WATCH_WAIT_MS),
    );

    let mut presence = state.registry.subscribe();
    let next = tokio::time::timeout(wait, async {
        loop {
            match presence.recv().await {
                Ok(snapshot) => break Some(snapshot),
                // A lagged observer just waits for the next broadcast.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break None,
            }
        }
    })
    .await;

    match next {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

/// DELETE /agent/{id}
/// Graceful disconnect
pub async fn unregister_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Unregistering agent: {}", id);

    agent_service::unregister_agent(&state, &id)
        .await
        .map_err(map_error)?;

    Ok(StatusCode::NO_CONTENT)
}
