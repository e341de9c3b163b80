//! Print command handler
//!
//! Dispatches a print job through the coordinator to a target agent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use inkfleet_core::domain::job::DocumentFormat;
use inkfleet_core::dto::dispatch::DispatchRequest;

use crate::config::Config;
use inkfleet_client::CoordinatorClient;

/// Arguments for dispatching a print job
#[derive(Args)]
pub struct PrintArgs {
    /// Target agent ID (case-insensitive)
    #[arg(long)]
    pub agent: String,

    /// Printer name on that agent
    #[arg(long)]
    pub printer: String,

    /// Document format
    #[arg(long, default_value = "plain_text")]
    pub format: String,

    /// Inline text payload
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File whose bytes become the payload
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print in landscape orientation
    #[arg(long)]
    pub landscape: bool,

    /// Paper size (defaults to the agent's A4)
    #[arg(long)]
    pub paper_size: Option<String>,
}

/// Handle the print command
pub async fn handle_print_command(args: PrintArgs, config: &Config) -> Result<()> {
    let client = CoordinatorClient::new(&config.coordinator_url);

    let format: DocumentFormat = args
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let data = match &args.file {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    if data.is_none() && args.text.is_none() {
        anyhow::bail!("provide a payload with --text or --file");
    }

    let request = DispatchRequest {
        agent_id: args.agent,
        printer_name: args.printer,
        format,
        content: args.text,
        data,
        landscape: args.landscape,
        paper_size: args.paper_size,
    };

    let ack = client.dispatch_print(&request).await?;

    println!(
        "{} Dispatched to agent {} (ack {})",
        "✓".green(),
        ack.agent_id.bold(),
        ack.ack_id
    );
    if !ack.printer_known {
        println!(
            "{}",
            "Warning: the agent has not reported that printer; the job may fail on arrival."
                .yellow()
        );
    }

    Ok(())
}
