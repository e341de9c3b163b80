//! File-sink render backend
//!
//! Writes the rendered payload into an output directory instead of a
//! physical device. Default backend in development and the workhorse of
//! tests: the "device" is just the filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use inkfleet_core::domain::job::DocumentFormat;

use super::{RenderBackend, RenderError, RenderRequest};

pub struct FileSinkBackend {
    output_dir: PathBuf,
}

impl FileSinkBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }
}

#[async_trait]
impl RenderBackend for FileSinkBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supports(&self, _format: DocumentFormat) -> bool {
        true
    }

    async fn print(&self, req: &RenderRequest) -> Result<(), RenderError> {
        let file_name = format!(
            "{}-{}.{}",
            req.printer_name,
            Uuid::new_v4(),
            req.format.extension()
        );
        let path = self.output_dir.join(file_name);

        let payload = match &req.text {
            Some(text) => text.as_bytes().to_vec(),
            None => req.bytes.clone(),
        };

        tokio::fs::write(&path, payload)
            .await
            .map_err(|e| RenderError::backend("file", e.to_string()))?;

        tracing::info!(
            "Rendered {} output for printer {} to {}",
            req.format,
            req.printer_name,
            path.display()
        );
        Ok(())
    }
}
