//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod agent;
mod print;

pub use agent::AgentCommands;
pub use print::PrintArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Agent fleet management
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Dispatch a print job to an agent
    Print(PrintArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Agent { command } => agent::handle_agent_command(command, config).await,
        Commands::Print(args) => print::handle_print_command(args, config).await,
    }
}
