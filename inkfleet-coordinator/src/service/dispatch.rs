//! Dispatch Service
//!
//! The dispatch gateway: routes an inbound print request to a connected
//! agent. The gateway never assigns job ids; the receiving agent's spooler
//! does that at enqueue. The caller gets an acknowledgement token, not a
//! completion guarantee.

use uuid::Uuid;

use inkfleet_core::dto::dispatch::{DispatchAck, DispatchRequest, PrintDispatch};

use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum DispatchError {
    ValidationError(String),
    AgentNotFound(String),
    AgentOffline(String),
    ConnectionLost(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Route a print request to its target agent
pub async fn dispatch_print(state: &AppState, req: DispatchRequest) -> Result<DispatchAck> {
    validate_request(&req)?;

    let agent = state
        .registry
        .find(&req.agent_id)
        .await
        .ok_or_else(|| DispatchError::AgentNotFound(req.agent_id.clone()))?;

    if !agent.is_online {
        return Err(DispatchError::AgentOffline(agent.agent_id));
    }

    // Advisory check only: printers can appear and disappear between
    // heartbeats, so an unknown name is flagged, never rejected.
    let printer_known = agent
        .printers
        .iter()
        .any(|p| p.name.eq_ignore_ascii_case(&req.printer_name));
    if !printer_known {
        tracing::warn!(
            "Printer {} not in last snapshot from agent {}",
            req.printer_name,
            agent.agent_id
        );
    }

    let connection_id = state
        .registry
        .resolve_connection(&agent.agent_id)
        .await
        .ok_or_else(|| DispatchError::AgentOffline(agent.agent_id.clone()))?;

    let dispatch = PrintDispatch {
        agent_id: agent.agent_id.clone(),
        machine_name: agent.machine_name.clone(),
        printer_name: req.printer_name,
        format: req.format,
        content: req.content,
        data: req.data,
        landscape: req.landscape,
        paper_size: req.paper_size.unwrap_or_default(),
        location: agent.location.clone(),
    };

    state
        .connections
        .send(&connection_id, dispatch)
        .await
        .map_err(|_| DispatchError::ConnectionLost(agent.agent_id.clone()))?;

    let ack_id = Uuid::new_v4();
    tracing::info!(
        "Dispatched print to agent {} (printer {}, ack {})",
        agent.agent_id,
        if printer_known { "known" } else { "unlisted" },
        ack_id
    );

    Ok(DispatchAck {
        ack_id,
        agent_id: agent.agent_id,
        printer_known,
    })
}

// =============================================================================
// Validation
// =============================================================================

fn validate_request(req: &DispatchRequest) -> Result<()> {
    if req.agent_id.trim().is_empty() {
        return Err(DispatchError::ValidationError(
            "Agent ID cannot be empty".to_string(),
        ));
    }

    if req.printer_name.trim().is_empty() {
        return Err(DispatchError::ValidationError(
            "Printer name cannot be empty".to_string(),
        ));
    }

    if !req.has_payload() {
        return Err(DispatchError::ValidationError(
            "Print request carries no payload".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::agent_service;
    use inkfleet_core::domain::agent::PrinterInfo;
    use inkfleet_core::domain::job::DocumentFormat;
    use inkfleet_core::dto::agent::RegisterAgent;
    use std::time::Duration;

    fn test_state() -> AppState {
        AppState::new(Duration::from_secs(60))
    }

    async fn register(state: &AppState, agent_id: &str) -> String {
        let session = agent_service::register_agent(
            state,
            RegisterAgent {
                agent_id: agent_id.to_string(),
                machine_name: "HOST1".to_string(),
                location: "Lobby".to_string(),
                printers: vec![PrinterInfo::named("HP-1")],
            },
        )
        .await
        .unwrap();
        session.connection_id
    }

    fn print_req(agent_id: &str, printer: &str) -> DispatchRequest {
        DispatchRequest {
            agent_id: agent_id.to_string(),
            printer_name: printer.to_string(),
            format: DocumentFormat::PlainText,
            content: Some("hello".to_string()),
            data: None,
            landscape: false,
            paper_size: None,
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_agent_mailbox() {
        let state = test_state();
        let connection_id = register(&state, "agent-1").await;

        let ack = dispatch_print(&state, print_req("agent-1", "HP-1"))
            .await
            .unwrap();
        assert!(ack.printer_known);

        let delivered = state
            .connections
            .next(&connection_id, Duration::from_millis(50))
            .await
            .unwrap()
            .expect("envelope should be waiting");
        assert_eq!(delivered.printer_name, "HP-1");
        assert_eq!(delivered.location, "Lobby");
        assert_eq!(delivered.machine_name, "HOST1");
    }

    #[tokio::test]
    async fn test_unknown_agent_fast_fails() {
        let state = test_state();
        assert!(matches!(
            dispatch_print(&state, print_req("ghost", "HP-1")).await,
            Err(DispatchError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_agent_fast_fails() {
        let state = test_state();
        register(&state, "agent-1").await;
        agent_service::unregister_agent(&state, "agent-1")
            .await
            .unwrap();

        assert!(matches!(
            dispatch_print(&state, print_req("agent-1", "HP-1")).await,
            Err(DispatchError::AgentOffline(_))
        ));
    }

    #[tokio::test]
    async fn test_unlisted_printer_is_advisory() {
        let state = test_state();
        register(&state, "agent-1").await;

        let ack = dispatch_print(&state, print_req("agent-1", "Mystery-Printer"))
            .await
            .unwrap();
        assert!(!ack.printer_known);
    }

    #[tokio::test]
    async fn test_contract_violations_never_enter_routing() {
        let state = test_state();
        register(&state, "agent-1").await;

        let mut req = print_req("agent-1", "HP-1");
        req.printer_name = String::new();
        assert!(matches!(
            dispatch_print(&state, req).await,
            Err(DispatchError::ValidationError(_))
        ));

        let mut req = print_req("agent-1", "HP-1");
        req.content = None;
        assert!(matches!(
            dispatch_print(&state, req).await,
            Err(DispatchError::ValidationError(_))
        ));
    }
}
