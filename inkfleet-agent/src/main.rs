//! Inkfleet Agent
//!
//! A print agent that runs next to the printers it serves.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Document store: Spooled payloads on disk while jobs wait
//! - Render backends: Ordered chain that turns documents into printed output
//! - Spooler: FIFO queue with an exclusive print lock, one job at a time
//! - Coordinator link: Registration, heartbeats, printer reports, dispatch drain
//! - Local API: HTTP surface for same-host job submission and status
//!
//! The agent accepts jobs from two directions (the local API and the
//! coordinator's dispatch channel); both feed the same spooler, so the
//! single-device guarantee holds regardless of origin.

mod config;
mod identity;
mod link;
mod printers;
mod reconnect;
mod render;
mod server;
mod spooler;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::link::CoordinatorLink;
use crate::render::RenderDispatcher;
use crate::spooler::PrintSpooler;
use crate::store::DocumentStore;
use inkfleet_client::CoordinatorClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkfleet_agent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Inkfleet Agent");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: coordinator_url={}, bind_addr={}",
        config.coordinator_url, config.bind_addr
    );

    // Resolve stable identity
    let agent_id = identity::load_or_create(&config.data_dir).await?;
    info!("Agent identity: {}", agent_id);

    // Initialize document store and render chain
    let store = Arc::new(
        DocumentStore::open(&config.spool_dir)
            .await
            .context("Failed to open document store")?,
    );
    let renderer = Arc::new(
        RenderDispatcher::from_config(&config.render_backends, &config.render_output_dir)
            .context("Failed to build render backend chain")?,
    );
    info!(
        "Render backend chain: {}",
        config.render_backends.join(" -> ")
    );

    // Start the spooler
    let spooler = Arc::new(PrintSpooler::start(store, renderer));
    info!("Print spooler started");

    // Local submission API
    let router = server::create_router(Arc::clone(&spooler));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind local API on {}", config.bind_addr))?;
    info!("Local API listening on {}", config.bind_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Local API server error: {}", e);
        }
    });

    // Coordinator link
    let client = Arc::new(CoordinatorClient::new(config.coordinator_url.clone()));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let link = CoordinatorLink::new(
        client,
        config.clone(),
        agent_id.clone(),
        Arc::clone(&spooler),
        shutdown_rx,
    );
    let link_task = tokio::spawn(link.run());

    info!("Agent initialized successfully");

    // Run until interrupted
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    // Stop the link first (it unregisters us), then drain the spooler.
    let _ = shutdown_tx.send(true);
    match link_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Coordinator link error: {}", e),
        Err(e) => error!("Coordinator link task panicked: {}", e),
    }

    spooler.stop().await;
    info!("Agent stopped");

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
