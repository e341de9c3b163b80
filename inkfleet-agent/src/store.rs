//! Document Store
//!
//! Persists large job payloads under the spool directory so oversized
//! uploads never sit in memory while queued. Files are named by job id with
//! an extension derived from the document format. Deletion is best-effort:
//! a leftover temp file must never fail the job it belonged to.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use inkfleet_core::domain::job::DocumentFormat;

/// Errors raised while persisting payloads
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create spool directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write spool file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// On-disk store for spooled job payloads
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Opens the store, creating the spool directory if absent (idempotent).
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a payload to `<root>/<job_id>.<ext>` and returns the path.
    pub async fn persist(
        &self,
        job_id: Uuid,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let path = self.root.join(format!("{}.{}", job_id, format.extension()));

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Spooled {} byte(s) to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Best-effort removal of a spool file; failures are logged only.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to delete spool file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_uses_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();

        let id = Uuid::new_v4();
        let path = store
            .persist(id, DocumentFormat::Pdf, b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{}.pdf", id));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("spool");

        DocumentStore::open(&nested).await.unwrap();
        let store = DocumentStore::open(&nested).await.unwrap();
        assert_eq!(store.root(), nested.as_path());
    }

    #[tokio::test]
    async fn test_remove_missing_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();

        store.remove(&dir.path().join("no-such-file.bin")).await;
    }
}
