use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod registry;
pub mod service;
pub mod state;

use crate::state::AppState;

/// Reference agent offline timeout (seconds) when none is configured.
const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkfleet_coordinator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Inkfleet Coordinator...");

    let agent_timeout = std::env::var("AGENT_OFFLINE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_AGENT_TIMEOUT_SECS);

    tracing::info!("Agent offline timeout: {}s", agent_timeout);

    let state = AppState::new(Duration::from_secs(agent_timeout));

    // Log presence transitions for operators
    spawn_presence_logger(&state);

    // Build router with all API endpoints
    let app = api::create_router(state);

    // Get bind address
    let addr =
        std::env::var("COORDINATOR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

/// Logs each presence broadcast so agent status changes are visible in the
/// coordinator's output even without an external observer.
fn spawn_presence_logger(state: &AppState) {
    let mut presence = state.registry.subscribe();
    tokio::spawn(async move {
        loop {
            match presence.recv().await {
                Ok(snapshot) => {
                    let online = snapshot.iter().filter(|a| a.is_online).count();
                    tracing::info!(
                        "Presence update: {}/{} agent(s) online",
                        online,
                        snapshot.len()
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Presence logger lagged, skipped {} update(s)", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
