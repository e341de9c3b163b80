//! Agent domain model
//!
//! Represents a print agent: a remote process owning local printers,
//! reachable only through a live connection it initiates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered print agent
///
/// The agent id is stable across restarts (generated once and persisted on
/// the agent's machine); the connection id changes on every reconnect and at
/// most one connection is authoritative per agent at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Stable identifier for the agent, not tied to the machine name
    pub agent_id: String,

    /// Hostname of the machine the agent runs on
    pub machine_name: String,

    /// Human-readable location ("Floor 3"); an empty re-registration never
    /// erases a previously known value
    pub location: String,

    /// Current live-connection handle; None while offline
    pub connection_id: Option<String>,

    /// When this agent was first registered
    pub registered_at: DateTime<Utc>,

    /// Last heartbeat or successful call from the agent
    pub last_seen: DateTime<Utc>,

    /// Set false on graceful disconnect or detected heartbeat timeout
    pub is_online: bool,

    /// Last-reported printer snapshot (replaced wholesale on each report)
    pub printers: Vec<PrinterInfo>,
}

/// A printer as last reported by its agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub name: String,
    pub status: String,
    pub driver: String,
    pub ip_address: Option<String>,
    pub ping_ms: Option<u32>,
}

impl PrinterInfo {
    /// Creates a printer entry with only a name known.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "ready".to_string(),
            driver: String::new(),
            ip_address: None,
            ping_ms: None,
        }
    }
}
