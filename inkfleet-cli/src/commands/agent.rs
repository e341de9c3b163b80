//! Agent command handlers
//!
//! Handles all agent-related CLI commands including listing the fleet,
//! viewing a single agent and removing stale registrations.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use inkfleet_core::domain::agent::AgentRecord;
use inkfleet_core::dto::agent::AgentSnapshot;

use crate::config::Config;
use inkfleet_client::CoordinatorClient;

/// Agent subcommands
#[derive(Subcommand)]
pub enum AgentCommands {
    /// List all registered agents
    List,
    /// Show details for one agent, including its printers
    Show {
        /// Agent ID (case-insensitive)
        id: String,
    },
    /// Remove an agent registration
    Remove {
        /// Agent ID (case-insensitive)
        id: String,
    },
    /// Follow presence changes as they happen
    Watch,
}

/// Handle agent commands
///
/// Routes agent subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The agent command to execute
/// * `config` - The CLI configuration
pub async fn handle_agent_command(command: AgentCommands, config: &Config) -> Result<()> {
    let client = CoordinatorClient::new(&config.coordinator_url);

    match command {
        AgentCommands::List => list_agents(&client).await,
        AgentCommands::Show { id } => show_agent(&client, &id).await,
        AgentCommands::Remove { id } => remove_agent(&client, &id).await,
        AgentCommands::Watch => watch_agents(&client).await,
    }
}

/// Follow presence broadcasts until interrupted
async fn watch_agents(client: &CoordinatorClient) -> Result<()> {
    println!("{}", "Watching agent presence (Ctrl-C to stop)...".bold());

    loop {
        match client.watch_agents(std::time::Duration::from_secs(20)).await? {
            Some(snapshot) => {
                let online = snapshot.iter().filter(|a| a.is_online).count();
                println!(
                    "{} {}/{} agent(s) online",
                    chrono_stamp().dimmed(),
                    online,
                    snapshot.len()
                );
                for agent in snapshot {
                    println!(
                        "  {} {} {}",
                        "▸".cyan(),
                        agent.agent_id.bold(),
                        colorize_presence(agent.is_online)
                    );
                }
            }
            None => continue,
        }
    }
}

fn chrono_stamp() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}

/// List all registered agents
async fn list_agents(client: &CoordinatorClient) -> Result<()> {
    let agents = client.list_agents().await?;

    if agents.is_empty() {
        println!("{}", "No agents registered.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} registered agent(s):", agents.len()).bold()
        );
        println!();
        for agent in agents {
            print_agent_summary(&agent);
        }
    }

    Ok(())
}

/// Show details for a single agent
async fn show_agent(client: &CoordinatorClient, id: &str) -> Result<()> {
    let agent = client.get_agent(id).await?;
    print_agent_details(&agent);
    Ok(())
}

/// Remove an agent registration
async fn remove_agent(client: &CoordinatorClient, id: &str) -> Result<()> {
    client.unregister_agent(id).await?;
    println!("{} Agent {} removed", "✓".green(), id.bold());
    Ok(())
}

/// Print an agent summary line
fn print_agent_summary(agent: &AgentSnapshot) {
    let presence = colorize_presence(agent.is_online);

    println!("  {} Agent {}", "▸".cyan(), agent.agent_id.bold());
    println!("    Presence:     {}", presence);
    println!("    Machine:      {}", agent.machine_name);
    if !agent.location.is_empty() {
        println!("    Location:     {}", agent.location);
    }
    println!("    Printers:     {}", agent.printer_count);
    println!(
        "    Last Seen:    {}",
        agent
            .last_seen
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print the full record for one agent
fn print_agent_details(agent: &AgentRecord) {
    let presence = colorize_presence(agent.is_online);

    println!("{} {}", "Agent".bold(), agent.agent_id.bold());
    println!("  Presence:     {}", presence);
    println!("  Machine:      {}", agent.machine_name);
    if !agent.location.is_empty() {
        println!("  Location:     {}", agent.location);
    }
    println!(
        "  Registered:   {}",
        agent
            .registered_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!(
        "  Last Seen:    {}",
        agent
            .last_seen
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );

    if agent.printers.is_empty() {
        println!("  Printers:     {}", "none reported".yellow());
    } else {
        println!("  Printers:");
        for printer in &agent.printers {
            let status = if printer.status == "ready" {
                printer.status.green()
            } else {
                printer.status.yellow()
            };
            println!("    {} {} ({})", "▸".cyan(), printer.name, status);
        }
    }
}

/// Colorize agent presence for display
fn colorize_presence(is_online: bool) -> colored::ColoredString {
    if is_online {
        "Online".green()
    } else {
        "Offline".red()
    }
}
