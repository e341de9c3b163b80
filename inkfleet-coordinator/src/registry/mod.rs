//! Agent Registry
//!
//! In-memory registry mapping agent identity to its current connection and
//! liveness metadata. The registry is the single source of truth for
//! presence: every mutation that changes what observers would see (register,
//! unregister, printer report, heartbeat-timeout flip) broadcasts the full
//! agent-status snapshot on a channel.
//!
//! Lookups are case-insensitive on the agent id to tolerate client
//! inconsistency. At most one connection id is authoritative per agent; a
//! re-registration supersedes the previous one.

pub mod connections;

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};

use inkfleet_core::domain::agent::{AgentRecord, PrinterInfo};
use inkfleet_core::dto::agent::{AgentSnapshot, RegisterAgent, UpdateAgentInfo};

/// How many presence snapshots may sit unread per subscriber.
const PRESENCE_CHANNEL_CAPACITY: usize = 64;

/// Registry of known agents with timeout-based offline detection
///
/// The stale sweep runs on every status-reporting read rather than on a
/// background timer; an agent whose `last_seen` is older than
/// `offline_after` flips to offline exactly once per crossing.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRecord>>,
    offline_after: chrono::Duration,
    presence: broadcast::Sender<Vec<AgentSnapshot>>,
}

impl AgentRegistry {
    /// Creates a registry that flips agents offline after `offline_after`
    /// without a heartbeat.
    pub fn new(offline_after: Duration) -> Self {
        let (presence, _) = broadcast::channel(PRESENCE_CHANNEL_CAPACITY);
        Self {
            agents: RwLock::new(HashMap::new()),
            offline_after: chrono::Duration::from_std(offline_after)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
            presence,
        }
    }

    /// Subscribes to presence broadcasts (full snapshot per mutation).
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<AgentSnapshot>> {
        self.presence.subscribe()
    }

    /// Registers an agent or refreshes an existing registration.
    ///
    /// The new connection and machine name win; an empty incoming location
    /// never erases a previously known non-empty one. Returns the updated
    /// record plus the superseded connection id, if any.
    pub async fn register(
        &self,
        req: RegisterAgent,
        connection_id: String,
    ) -> (AgentRecord, Option<String>) {
        let key = registry_key(&req.agent_id);
        let now = chrono::Utc::now();

        let mut agents = self.agents.write().await;
        let superseded = match agents.get_mut(&key) {
            Some(record) => {
                let previous = record.connection_id.take();
                record.machine_name = req.machine_name;
                if !req.location.trim().is_empty() {
                    record.location = req.location;
                }
                if !req.printers.is_empty() {
                    record.printers = req.printers;
                }
                record.connection_id = Some(connection_id);
                record.last_seen = now;
                record.is_online = true;
                previous
            }
            None => {
                agents.insert(
                    key.clone(),
                    AgentRecord {
                        agent_id: req.agent_id,
                        machine_name: req.machine_name,
                        location: req.location,
                        connection_id: Some(connection_id),
                        registered_at: now,
                        last_seen: now,
                        is_online: true,
                        printers: req.printers,
                    },
                );
                None
            }
        };

        let record = agents[&key].clone();
        self.broadcast(&agents);
        (record, superseded)
    }

    /// Refreshes `last_seen` for an agent and forces it online.
    ///
    /// Returns false for an unknown agent. A plain heartbeat does not
    /// broadcast unless it flips the agent back online.
    pub async fn heartbeat(&self, agent_id: &str) -> bool {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;

        let Some(record) = agents.get_mut(&key) else {
            return false;
        };

        record.last_seen = chrono::Utc::now();
        let revived = !record.is_online;
        record.is_online = true;

        if revived {
            self.broadcast(&agents);
        }
        true
    }

    /// Replaces an agent's printer snapshot and refreshes its liveness.
    pub async fn update_printers(&self, agent_id: &str, printers: Vec<PrinterInfo>) -> bool {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;

        let Some(record) = agents.get_mut(&key) else {
            return false;
        };

        record.printers = printers;
        record.last_seen = chrono::Utc::now();
        record.is_online = true;

        self.broadcast(&agents);
        true
    }

    /// Applies an out-of-band display-metadata update.
    pub async fn update_info(&self, agent_id: &str, info: UpdateAgentInfo) -> Option<AgentRecord> {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;

        let record = agents.get_mut(&key)?;
        if let Some(machine_name) = info.machine_name {
            record.machine_name = machine_name;
        }
        if let Some(location) = info.location {
            record.location = location;
        }
        let updated = record.clone();
        self.broadcast(&agents);
        Some(updated)
    }

    /// Marks an agent offline immediately (graceful disconnect).
    ///
    /// Returns the connection id that was dropped, if one was live.
    pub async fn unregister(&self, agent_id: &str) -> Option<String> {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;

        let record = agents.get_mut(&key)?;
        let dropped = record.connection_id.take();
        record.is_online = false;
        record.last_seen = chrono::Utc::now();

        self.broadcast(&agents);
        dropped
    }

    /// Resolves the current live connection for an agent.
    ///
    /// Runs the stale sweep first so a superseded or timed-out connection is
    /// never returned.
    pub async fn resolve_connection(&self, agent_id: &str) -> Option<String> {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;
        if self.sweep(&mut agents) {
            self.broadcast(&agents);
        }

        let record = agents.get(&key)?;
        if !record.is_online {
            return None;
        }
        record.connection_id.clone()
    }

    /// Looks up an agent record, sweeping staleness first.
    pub async fn find(&self, agent_id: &str) -> Option<AgentRecord> {
        let key = registry_key(agent_id);
        let mut agents = self.agents.write().await;
        if self.sweep(&mut agents) {
            self.broadcast(&agents);
        }
        agents.get(&key).cloned()
    }

    /// Current status snapshot of all agents, sweeping staleness first.
    pub async fn snapshot(&self) -> Vec<AgentSnapshot> {
        let mut agents = self.agents.write().await;
        if self.sweep(&mut agents) {
            self.broadcast(&agents);
        }
        Self::snapshots_of(&agents)
    }

    /// Flips agents whose heartbeat is older than the timeout to offline.
    /// Returns true if any crossing happened.
    fn sweep(&self, agents: &mut HashMap<String, AgentRecord>) -> bool {
        let cutoff = chrono::Utc::now() - self.offline_after;
        let mut flipped = false;

        for record in agents.values_mut() {
            if record.is_online && record.last_seen < cutoff {
                record.is_online = false;
                record.connection_id = None;
                flipped = true;
                tracing::info!("Agent {} timed out, marked offline", record.agent_id);
            }
        }

        flipped
    }

    fn broadcast(&self, agents: &HashMap<String, AgentRecord>) {
        // Nobody listening is fine; send only fails without receivers.
        let _ = self.presence.send(Self::snapshots_of(agents));
    }

    fn snapshots_of(agents: &HashMap<String, AgentRecord>) -> Vec<AgentSnapshot> {
        let mut snapshots: Vec<AgentSnapshot> = agents.values().map(AgentSnapshot::from).collect();
        snapshots.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        snapshots
    }
}

fn registry_key(agent_id: &str) -> String {
    agent_id.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn register_req(agent_id: &str, location: &str) -> RegisterAgent {
        RegisterAgent {
            agent_id: agent_id.to_string(),
            machine_name: "HOST1".to_string(),
            location: location.to_string(),
            printers: vec![],
        }
    }

    #[tokio::test]
    async fn test_location_merge_rule() {
        let registry = AgentRegistry::new(Duration::from_secs(60));

        registry
            .register(register_req("agent-1", "Lobby"), "conn-A".to_string())
            .await;
        let (record, superseded) = registry
            .register(register_req("agent-1", ""), "conn-B".to_string())
            .await;

        assert_eq!(record.location, "Lobby");
        assert_eq!(superseded.as_deref(), Some("conn-A"));
        assert_eq!(
            registry.resolve_connection("agent-1").await.as_deref(),
            Some("conn-B")
        );
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup() {
        let registry = AgentRegistry::new(Duration::from_secs(60));
        registry
            .register(register_req("Agent-1", "Lobby"), "conn-A".to_string())
            .await;

        assert!(registry.heartbeat("AGENT-1").await);
        assert!(registry.find("agent-1").await.is_some());
    }

    #[tokio::test]
    async fn test_unregister_marks_offline_immediately() {
        let registry = AgentRegistry::new(Duration::from_secs(60));
        registry
            .register(register_req("agent-1", ""), "conn-A".to_string())
            .await;

        let dropped = registry.unregister("agent-1").await;
        assert_eq!(dropped.as_deref(), Some("conn-A"));

        let record = registry.find("agent-1").await.unwrap();
        assert!(!record.is_online);
        assert!(registry.resolve_connection("agent-1").await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_flip_broadcasts_once() {
        let registry = AgentRegistry::new(Duration::from_millis(1));
        registry
            .register(register_req("agent-1", ""), "conn-A".to_string())
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut presence = registry.subscribe();

        let snapshot = registry.snapshot().await;
        assert!(!snapshot[0].is_online);

        let update = presence.try_recv().expect("flip should broadcast");
        assert!(!update[0].is_online);

        // Second read: already offline, no new crossing, no new broadcast.
        registry.snapshot().await;
        assert!(matches!(presence.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_heartbeat_revives_agent() {
        let registry = AgentRegistry::new(Duration::from_secs(60));
        registry
            .register(register_req("agent-1", ""), "conn-A".to_string())
            .await;
        registry.unregister("agent-1").await;

        assert!(registry.heartbeat("agent-1").await);
        let record = registry.find("agent-1").await.unwrap();
        assert!(record.is_online);
    }

    #[tokio::test]
    async fn test_printer_report_replaces_snapshot() {
        let registry = AgentRegistry::new(Duration::from_secs(60));
        registry
            .register(register_req("agent-1", ""), "conn-A".to_string())
            .await;

        registry
            .update_printers(
                "agent-1",
                vec![PrinterInfo::named("HP-1"), PrinterInfo::named("HP-2")],
            )
            .await;
        registry
            .update_printers("agent-1", vec![PrinterInfo::named("HP-3")])
            .await;

        let record = registry.find("agent-1").await.unwrap();
        assert_eq!(record.printers.len(), 1);
        assert_eq!(record.printers[0].name, "HP-3");
    }
}
