//! Agent identity
//!
//! A stable agent id that survives restarts. The AGENT_ID environment
//! variable wins when set; otherwise the id is read from a file in the
//! data directory, generated on first run.

use std::path::Path;

use anyhow::Context;

const IDENTITY_FILE: &str = "agent.id";

/// Resolves this agent's stable identifier.
///
/// Precedence: AGENT_ID env var, then the persisted identity file, then a
/// freshly generated UUID written back for future runs.
pub async fn load_or_create(data_dir: &Path) -> anyhow::Result<String> {
    if let Ok(id) = std::env::var("AGENT_ID") {
        let id = id.trim().to_string();
        if !id.is_empty() {
            return Ok(id);
        }
    }

    let path = data_dir.join(IDENTITY_FILE);
    if let Ok(existing) = tokio::fs::read_to_string(&path).await {
        let existing = existing.trim().to_string();
        if !existing.is_empty() {
            tracing::debug!("Loaded agent identity from {}", path.display());
            return Ok(existing);
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    tokio::fs::write(&path, &id)
        .await
        .with_context(|| format!("failed to persist agent identity to {}", path.display()))?;
    tracing::info!("Generated new agent identity {}", id);

    Ok(id)
}
