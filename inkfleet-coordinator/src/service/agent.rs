//! Agent Service
//!
//! Business logic for agent registration and presence.

use inkfleet_core::domain::agent::{AgentRecord, PrinterInfo};
use inkfleet_core::dto::agent::{AgentSession, AgentSnapshot, RegisterAgent, UpdateAgentInfo};

use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum AgentError {
    NotFound(String),
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Register an agent (or refresh an existing registration)
///
/// Opens a fresh connection for the agent; if the agent was already
/// connected, the previous connection is superseded and closed.
pub async fn register_agent(state: &AppState, req: RegisterAgent) -> Result<AgentSession> {
    validate_register_request(&req)?;

    let connection_id = state.connections.open().await;
    let (record, superseded) = state.registry.register(req, connection_id.clone()).await;

    if let Some(old_connection) = superseded {
        state.connections.close(&old_connection).await;
        tracing::info!(
            "Agent {} reconnected, superseded connection {}",
            record.agent_id,
            old_connection
        );
    }

    tracing::info!(
        "Agent registered: {} on {} ({} printer(s))",
        record.agent_id,
        record.machine_name,
        record.printers.len()
    );

    Ok(AgentSession {
        agent_id: record.agent_id,
        connection_id,
    })
}

/// Record a heartbeat from an agent
pub async fn heartbeat(state: &AppState, agent_id: &str) -> Result<()> {
    if !state.registry.heartbeat(agent_id).await {
        return Err(AgentError::NotFound(agent_id.to_string()));
    }

    tracing::debug!("Heartbeat received from agent: {}", agent_id);

    Ok(())
}

/// Replace an agent's printer snapshot
pub async fn report_printers(
    state: &AppState,
    agent_id: &str,
    printers: Vec<PrinterInfo>,
) -> Result<()> {
    if !state.registry.update_printers(agent_id, printers).await {
        return Err(AgentError::NotFound(agent_id.to_string()));
    }

    tracing::debug!("Printer snapshot updated for agent: {}", agent_id);

    Ok(())
}

/// Apply an out-of-band display-metadata update
pub async fn update_info(
    state: &AppState,
    agent_id: &str,
    info: UpdateAgentInfo,
) -> Result<AgentRecord> {
    state
        .registry
        .update_info(agent_id, info)
        .await
        .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))
}

/// Get an agent by id
pub async fn get_agent(state: &AppState, agent_id: &str) -> Result<AgentRecord> {
    state
        .registry
        .find(agent_id)
        .await
        .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))
}

/// List the current status snapshot of all agents
pub async fn list_agents(state: &AppState) -> Result<Vec<AgentSnapshot>> {
    Ok(state.registry.snapshot().await)
}

/// Gracefully disconnect an agent
pub async fn unregister_agent(state: &AppState, agent_id: &str) -> Result<()> {
    let Some(dropped_connection) = state.registry.unregister(agent_id).await else {
        // Offline agents can still be unregistered again; only an unknown
        // id is an error.
        if state.registry.find(agent_id).await.is_none() {
            return Err(AgentError::NotFound(agent_id.to_string()));
        }
        return Ok(());
    };

    state.connections.close(&dropped_connection).await;
    tracing::info!("Agent unregistered: {}", agent_id);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_register_request(req: &RegisterAgent) -> Result<()> {
    if req.agent_id.trim().is_empty() {
        return Err(AgentError::ValidationError(
            "Agent ID cannot be empty".to_string(),
        ));
    }

    if req.agent_id.len() > 255 {
        return Err(AgentError::ValidationError(
            "Agent ID is too long (max 255 characters)".to_string(),
        ));
    }

    if req.machine_name.trim().is_empty() {
        return Err(AgentError::ValidationError(
            "Machine name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_state() -> AppState {
        AppState::new(Duration::from_secs(60))
    }

    fn register_req(agent_id: &str) -> RegisterAgent {
        RegisterAgent {
            agent_id: agent_id.to_string(),
            machine_name: "HOST1".to_string(),
            location: "Lobby".to_string(),
            printers: vec![PrinterInfo::named("HP-1")],
        }
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = test_state();

        let mut req = register_req("");
        assert!(matches!(
            register_agent(&state, req.clone()).await,
            Err(AgentError::ValidationError(_))
        ));

        req.agent_id = "agent-1".to_string();
        req.machine_name = String::new();
        assert!(matches!(
            register_agent(&state, req).await,
            Err(AgentError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_reregistration_closes_old_connection() {
        let state = test_state();

        let first = register_agent(&state, register_req("agent-1")).await.unwrap();
        let second = register_agent(&state, register_req("agent-1")).await.unwrap();
        assert_ne!(first.connection_id, second.connection_id);

        // The superseded mailbox is gone; the new one is live.
        let gone = state
            .connections
            .next(&first.connection_id, Duration::from_millis(5))
            .await;
        assert!(gone.is_err());
        let live = state
            .connections
            .next(&second.connection_id, Duration::from_millis(5))
            .await;
        assert!(live.is_ok());
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_agent() {
        let state = test_state();
        assert!(matches!(
            heartbeat(&state, "ghost").await,
            Err(AgentError::NotFound(_))
        ));
    }
}
