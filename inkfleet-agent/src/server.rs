//! Local submission API
//!
//! Small HTTP surface bound on the agent host so local tools can submit
//! jobs and check on them without going through the coordinator.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use inkfleet_core::dto::job::{JobStatusReport, JobTicket, SubmitPrintJob};

use crate::spooler::{PrintSpooler, SpoolError};

const LOCAL_ORIGIN: &str = "local-http";

pub fn create_router(spooler: Arc<PrintSpooler>) -> Router {
    Router::new()
        .route("/print", post(submit_job))
        .route("/job/{job_id}/status", get(job_status))
        .route("/health", get(health))
        .with_state(spooler)
}

/// POST /print
async fn submit_job(
    State(spooler): State<Arc<PrintSpooler>>,
    Json(request): Json<SubmitPrintJob>,
) -> impl IntoResponse {
    match spooler.enqueue(request.into_job(LOCAL_ORIGIN)).await {
        Ok(job_id) => (StatusCode::OK, Json(json!(JobTicket { job_id }))),
        Err(e) => {
            let status = match e {
                SpoolError::MissingPrinter | SpoolError::EmptyPayload => StatusCode::BAD_REQUEST,
                SpoolError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
                SpoolError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// GET /job/{job_id}/status
///
/// Always 200: untracked ids answer with status "unknown" rather than 404,
/// since the bounded history makes absence ambiguous.
async fn job_status(
    State(spooler): State<Arc<PrintSpooler>>,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse {
    Json(JobStatusReport {
        job_id,
        status: spooler.status(job_id),
    })
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
