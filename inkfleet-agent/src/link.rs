//! Coordinator link
//!
//! Keeps the agent connected to the coordinator: registers on startup,
//! sends heartbeats and printer snapshots on their intervals, and drains
//! dispatched print jobs off the live connection into the local spooler.
//!
//! The drain loop owns the connection id. When the coordinator reports the
//! connection gone (superseded by a newer registration, or lost to a
//! coordinator restart), the link re-registers with a persistent backoff
//! and carries on with the fresh connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use inkfleet_client::{ClientError, CoordinatorClient};
use inkfleet_core::dto::agent::RegisterAgent;

use crate::config::Config;
use crate::printers;
use crate::reconnect::ReconnectPolicy;
use crate::spooler::PrintSpooler;

/// Pause after a transport-level poll error before trying again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(2);

pub struct CoordinatorLink {
    client: Arc<CoordinatorClient>,
    config: Config,
    agent_id: String,
    spooler: Arc<PrintSpooler>,
    shutdown: watch::Receiver<bool>,
}

impl CoordinatorLink {
    pub fn new(
        client: Arc<CoordinatorClient>,
        config: Config,
        agent_id: String,
        spooler: Arc<PrintSpooler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            config,
            agent_id,
            spooler,
            shutdown,
        }
    }

    /// Runs the link until shutdown is signalled.
    ///
    /// Registration happens here so callers do not race the heartbeat and
    /// printer tasks against an agent the coordinator has never seen.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut connection_id = self.register(&ReconnectPolicy::default()).await?;
        info!(
            "Registered with coordinator, connection {}",
            connection_id
        );

        let heartbeat = tokio::spawn(heartbeat_loop(
            Arc::clone(&self.client),
            self.agent_id.clone(),
            self.config.heartbeat_interval,
            self.shutdown.clone(),
        ));
        let printer_refresh = tokio::spawn(printer_refresh_loop(
            Arc::clone(&self.client),
            self.agent_id.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        ));

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                polled = self.client.next_dispatch(&connection_id, self.config.poll_wait) => {
                    match polled {
                        Ok(Some(dispatch)) => {
                            let job = dispatch.into_job();
                            let job_id = job.id;
                            match self.spooler.enqueue(job).await {
                                Ok(id) => info!("Accepted dispatched job {}", id),
                                Err(e) => {
                                    warn!("Rejected dispatched job {}: {}", job_id, e);
                                }
                            }
                        }
                        Ok(None) => {
                            debug!("Long poll elapsed without work");
                        }
                        Err(ClientError::ConnectionGone(_)) => {
                            warn!("Connection {} is gone, re-registering", connection_id);
                            connection_id = self.register(&ReconnectPolicy::persistent()).await?;
                            info!("Reconnected, new connection {}", connection_id);
                        }
                        Err(e) => {
                            warn!("Dispatch poll failed: {}", e);
                            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        heartbeat.abort();
        printer_refresh.abort();

        // Best-effort goodbye so the coordinator frees the record promptly
        // instead of waiting out the heartbeat timeout.
        if let Err(e) = self.client.unregister_agent(&self.agent_id).await {
            warn!("Failed to unregister from coordinator: {}", e);
        }

        Ok(())
    }

    async fn register(&self, policy: &ReconnectPolicy) -> anyhow::Result<String> {
        let printers = printers::discover(&self.config.printers).await;
        let request = RegisterAgent {
            agent_id: self.agent_id.clone(),
            machine_name: machine_name(),
            location: self.config.location.clone(),
            printers,
        };

        let session = policy
            .run("register with coordinator", || {
                self.client.register_agent(&request)
            })
            .await?;
        Ok(session.connection_id)
    }
}

async fn heartbeat_loop(
    client: Arc<CoordinatorClient>,
    agent_id: String,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = client.send_heartbeat(&agent_id).await {
                    warn!("Heartbeat failed: {}", e);
                }
            }
        }
    }
}

async fn printer_refresh_loop(
    client: Arc<CoordinatorClient>,
    agent_id: String,
    config: Config,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.printer_refresh_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; registration already carried the
    // initial snapshot.
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let printers = printers::discover(&config.printers).await;
                debug!("Reporting {} printer(s)", printers.len());
                if let Err(e) = client.report_printers(&agent_id, printers).await {
                    warn!("Printer report failed: {}", e);
                }
            }
        }
    }
}

/// The machine's hostname, for display in fleet listings.
fn machine_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}
