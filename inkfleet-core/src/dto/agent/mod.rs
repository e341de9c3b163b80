//! Agent DTOs
//!
//! Data transfer objects for agent registration, presence and printer
//! reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentRecord, PrinterInfo};

/// Request to register an agent with the coordinator
///
/// Sent on startup and on every reconnect; a re-registration supersedes the
/// agent's previous connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgent {
    pub agent_id: String,
    pub machine_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub printers: Vec<PrinterInfo>,
}

/// Coordinator's answer to a registration: the connection handle the agent
/// uses to drain dispatched jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub agent_id: String,
    pub connection_id: String,
}

/// Out-of-band update of an agent's display metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAgentInfo {
    pub machine_name: Option<String>,
    pub location: Option<String>,
}

/// Replacement printer snapshot for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPrinters {
    pub printers: Vec<PrinterInfo>,
}

/// Point-in-time agent status, broadcast to presence observers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub machine_name: String,
    pub location: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub printer_count: usize,
}

impl From<&AgentRecord> for AgentSnapshot {
    fn from(record: &AgentRecord) -> Self {
        AgentSnapshot {
            agent_id: record.agent_id.clone(),
            machine_name: record.machine_name.clone(),
            location: record.location.clone(),
            is_online: record.is_online,
            last_seen: record.last_seen,
            printer_count: record.printers.len(),
        }
    }
}
