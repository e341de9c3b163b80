//! Printer discovery
//!
//! Builds the printer list reported to the coordinator. A statically
//! configured list takes precedence; otherwise the system print service
//! is probed via `lpstat`.

use tokio::process::Command;

use inkfleet_core::domain::agent::PrinterInfo;

/// Returns the printers this agent exposes.
///
/// Probing is best-effort: a missing or failing `lpstat` yields an empty
/// list rather than an error, since an agent with no printers is still a
/// valid (if idle) member of the fleet.
pub async fn discover(configured: &[String]) -> Vec<PrinterInfo> {
    if !configured.is_empty() {
        return configured.iter().map(|name| PrinterInfo::named(name)).collect();
    }

    match probe_lpstat().await {
        Ok(printers) => printers,
        Err(e) => {
            tracing::warn!("Printer probe failed, reporting none: {}", e);
            Vec::new()
        }
    }
}

async fn probe_lpstat() -> anyhow::Result<Vec<PrinterInfo>> {
    let output = Command::new("lpstat").arg("-p").output().await?;
    if !output.status.success() {
        anyhow::bail!("lpstat exited with {}", output.status);
    }

    Ok(parse_lpstat(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `lpstat -p` output, one printer per "printer <name> ..." line.
fn parse_lpstat(stdout: &str) -> Vec<PrinterInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("printer ")?;
            let name = rest.split_whitespace().next()?;
            let mut info = PrinterInfo::named(name);
            info.status = if rest.contains("is idle") || rest.contains("now printing") {
                "ready".to_string()
            } else {
                "unavailable".to_string()
            };
            Some(info)
        })
        .collect()
}
