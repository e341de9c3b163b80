//! Agent configuration
//!
//! Defines all configurable parameters for the print agent including
//! coordinator connection settings, heartbeat and long-poll timing,
//! spool and render output directories, and the static printer list.

use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration
///
/// All timeouts and intervals are configurable to allow tuning
/// for different deployment scenarios (dev vs prod, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct Config {
    /// Coordinator base URL (e.g., "http://localhost:8080")
    pub coordinator_url: String,

    /// Human-readable site label reported to the coordinator ("" keeps
    /// whatever the coordinator already has on record)
    pub location: String,

    /// Directory holding agent state (identity file, spool subdirectory)
    pub data_dir: PathBuf,

    /// Directory for spooled documents awaiting print
    pub spool_dir: PathBuf,

    /// Bind address for the local job-submission API
    pub bind_addr: String,

    /// How often to send presence heartbeats to the coordinator
    pub heartbeat_interval: Duration,

    /// How long each long-poll for dispatched work may block server-side
    pub poll_wait: Duration,

    /// How often to re-probe printers and report the list upstream
    pub printer_refresh_interval: Duration,

    /// Statically configured printer names; empty means probe the system
    pub printers: Vec<String>,

    /// Render backend chain, tried in order per job
    pub render_backends: Vec<String>,

    /// Output directory for the "file" render backend
    pub render_output_dir: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(coordinator_url: String) -> Self {
        let data_dir = PathBuf::from("./agent-data");
        Self {
            coordinator_url,
            location: String::new(),
            spool_dir: data_dir.join("spool"),
            render_output_dir: data_dir.join("rendered"),
            data_dir,
            bind_addr: "127.0.0.1:9175".to_string(),
            heartbeat_interval: Duration::from_secs(20),
            poll_wait: Duration::from_secs(20),
            printer_refresh_interval: Duration::from_secs(60),
            printers: Vec::new(),
            render_backends: vec!["file".to_string()],
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - COORDINATOR_URL (required)
    /// - AGENT_LOCATION (optional, default: empty)
    /// - AGENT_DATA_DIR (optional, default: ./agent-data)
    /// - AGENT_SPOOL_DIR (optional, default: <data_dir>/spool)
    /// - AGENT_BIND_ADDR (optional, default: 127.0.0.1:9175)
    /// - HEARTBEAT_INTERVAL (optional, seconds, default: 20)
    /// - POLL_WAIT (optional, seconds, default: 20)
    /// - PRINTER_REFRESH_INTERVAL (optional, seconds, default: 60)
    /// - AGENT_PRINTERS (optional, comma-separated names, default: probe)
    /// - AGENT_RENDER_BACKENDS (optional, comma-separated, default: file)
    /// - AGENT_RENDER_OUTPUT_DIR (optional, default: <data_dir>/rendered)
    pub fn from_env() -> anyhow::Result<Self> {
        let coordinator_url = std::env::var("COORDINATOR_URL")
            .map_err(|_| anyhow::anyhow!("COORDINATOR_URL environment variable not set"))?;

        let mut config = Self::new(coordinator_url);

        if let Ok(location) = std::env::var("AGENT_LOCATION") {
            config.location = location;
        }

        if let Ok(dir) = std::env::var("AGENT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.spool_dir = config.data_dir.join("spool");
            config.render_output_dir = config.data_dir.join("rendered");
        }

        if let Ok(dir) = std::env::var("AGENT_SPOOL_DIR") {
            config.spool_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("AGENT_RENDER_OUTPUT_DIR") {
            config.render_output_dir = PathBuf::from(dir);
        }

        if let Ok(addr) = std::env::var("AGENT_BIND_ADDR") {
            config.bind_addr = addr;
        }

        config.heartbeat_interval = env_secs("HEARTBEAT_INTERVAL", config.heartbeat_interval);
        config.poll_wait = env_secs("POLL_WAIT", config.poll_wait);
        config.printer_refresh_interval =
            env_secs("PRINTER_REFRESH_INTERVAL", config.printer_refresh_interval);

        if let Ok(list) = std::env::var("AGENT_PRINTERS") {
            config.printers = parse_csv(&list);
        }

        if let Ok(list) = std::env::var("AGENT_RENDER_BACKENDS") {
            let backends = parse_csv(&list);
            if !backends.is_empty() {
                config.render_backends = backends;
            }
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.coordinator_url.is_empty() {
            anyhow::bail!("coordinator_url cannot be empty");
        }

        if !self.coordinator_url.starts_with("http://")
            && !self.coordinator_url.starts_with("https://")
        {
            anyhow::bail!("coordinator_url must start with http:// or https://");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.heartbeat_interval.as_secs() == 0 {
            anyhow::bail!("heartbeat_interval must be greater than 0");
        }

        if self.poll_wait.as_secs() == 0 {
            anyhow::bail!("poll_wait must be greater than 0");
        }

        if self.render_backends.is_empty() {
            anyhow::bail!("render_backends cannot be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(20));
        assert_eq!(config.poll_wait, Duration::from_secs(20));
        assert_eq!(config.bind_addr, "127.0.0.1:9175");
        assert_eq!(config.render_backends, vec!["file".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid URL should fail
        config.coordinator_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.coordinator_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());

        // Empty backend chain should fail
        config.render_backends.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_csv_trims_and_drops_empties() {
        assert_eq!(
            parse_csv("HP LaserJet, , Brother-2000,"),
            vec!["HP LaserJet".to_string(), "Brother-2000".to_string()]
        );
        assert!(parse_csv("").is_empty());
    }
}
