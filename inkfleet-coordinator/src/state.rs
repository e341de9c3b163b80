//! Shared coordinator state
//!
//! Explicitly constructed singletons with process-wide lifetime, injected
//! into handlers through axum state rather than held as ambient statics, so
//! the registry and gateway stay independently testable.

use std::sync::Arc;
use std::time::Duration;

use crate::registry::AgentRegistry;
use crate::registry::connections::ConnectionTable;

/// Application state shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub connections: Arc<ConnectionTable>,
}

impl AppState {
    /// Builds the coordinator state with the given agent offline timeout.
    pub fn new(agent_offline_after: Duration) -> Self {
        Self {
            registry: Arc::new(AgentRegistry::new(agent_offline_after)),
            connections: Arc::new(ConnectionTable::new()),
        }
    }
}
