//! Agent-related API endpoints

use std::time::Duration;

use crate::CoordinatorClient;
use crate::error::Result;
use inkfleet_core::domain::agent::{AgentRecord, PrinterInfo};
use inkfleet_core::dto::agent::{
    AgentSession, AgentSnapshot, RegisterAgent, ReportPrinters, UpdateAgentInfo,
};
use inkfleet_core::dto::dispatch::PrintDispatch;

impl CoordinatorClient {
    // =============================================================================
    // Agent Registration & Lifecycle
    // =============================================================================

    /// Register an agent with the coordinator
    ///
    /// Called at startup and after any connection loss; a re-registration
    /// supersedes the previous connection, so the returned session carries a
    /// fresh connection id.
    pub async fn register_agent(&self, req: &RegisterAgent) -> Result<AgentSession> {
        let url = format!("{}/agent/register", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Send a heartbeat to the coordinator
    ///
    /// This keeps the agent marked as online in the coordinator's registry.
    /// Should be called periodically (e.g., every 20 seconds).
    pub async fn send_heartbeat(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/agent/{}/heartbeat", self.base_url, agent_id);
        let response = self.client.post(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Replace the agent's printer snapshot on the coordinator
    pub async fn report_printers(&self, agent_id: &str, printers: Vec<PrinterInfo>) -> Result<()> {
        let url = format!("{}/agent/{}/printers", self.base_url, agent_id);
        let response = self
            .client
            .post(&url)
            .json(&ReportPrinters { printers })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Update an agent's display metadata (machine name, location)
    pub async fn update_agent_info(
        &self,
        agent_id: &str,
        info: &UpdateAgentInfo,
    ) -> Result<AgentRecord> {
        let url = format!("{}/agent/{}/info", self.base_url, agent_id);
        let response = self.client.post(&url).json(info).send().await?;

        self.handle_response(response).await
    }

    /// Gracefully disconnect an agent
    pub async fn unregister_agent(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/agent/{}", self.base_url, agent_id);
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Live-Connection Drain
    // =============================================================================

    /// Wait for the next dispatched print job on a live connection
    ///
    /// Long-polls the coordinator for up to `wait`. Returns Ok(None) when
    /// the wait elapsed without a dispatch, and `ClientError::ConnectionGone`
    /// once the connection has been superseded or closed (the agent should
    /// then re-register).
    pub async fn next_dispatch(
        &self,
        connection_id: &str,
        wait: Duration,
    ) -> Result<Option<PrintDispatch>> {
        let url = format!(
            "{}/connection/{}/next?wait_ms={}",
            self.base_url,
            connection_id,
            wait.as_millis()
        );
        let response = self.client.get(&url).send().await?;

        self.handle_poll_response(response, connection_id).await
    }

    /// Wait for the next presence broadcast from the coordinator
    ///
    /// Long-polls for up to `wait`; Ok(None) once the wait elapses without
    /// any agent status change.
    pub async fn watch_agents(&self, wait: Duration) -> Result<Option<Vec<AgentSnapshot>>> {
        let url = format!(
            "{}/agent/watch?wait_ms={}",
            self.base_url,
            wait.as_millis()
        );
        let response = self.client.get(&url).send().await?;

        self.handle_poll_response(response, "presence").await
    }

    // =============================================================================
    // Agent Query
    // =============================================================================

    /// List the status snapshot of all registered agents
    pub async fn list_agents(&self) -> Result<Vec<AgentSnapshot>> {
        let url = format!("{}/agent/list", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the full record for a specific agent
    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord> {
        let url = format!("{}/agent/{}", self.base_url, agent_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
