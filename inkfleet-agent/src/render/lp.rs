//! CUPS `lp` render backend
//!
//! Hands the payload to the system print spooler by piping it into the `lp`
//! command. The platform spooler does the actual device rendering; this
//! backend only surfaces success or the captured stderr.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use inkfleet_core::domain::job::DocumentFormat;

use super::{RenderBackend, RenderError, RenderRequest};

pub struct LpCommandBackend {
    lp_path: String,
}

impl LpCommandBackend {
    pub fn new() -> Self {
        Self {
            lp_path: "lp".to_string(),
        }
    }
}

impl Default for LpCommandBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderBackend for LpCommandBackend {
    fn name(&self) -> &'static str {
        "lp"
    }

    fn supports(&self, _format: DocumentFormat) -> bool {
        // lp accepts text, PDF and raw streams alike; the CUPS filter chain
        // decides what to do with the bytes.
        true
    }

    async fn print(&self, req: &RenderRequest) -> Result<(), RenderError> {
        let mut command = Command::new(&self.lp_path);
        command
            .arg("-d")
            .arg(&req.printer_name)
            .arg("-o")
            .arg(format!("media={}", req.paper_size));

        if req.landscape {
            command.arg("-o").arg("landscape");
        }
        if req.format == DocumentFormat::Raw {
            command.arg("-o").arg("raw");
        }

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| RenderError::backend("lp", format!("failed to spawn lp: {}", e)))?;

        let payload = match &req.text {
            Some(text) => text.as_bytes().to_vec(),
            None => req.bytes.clone(),
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| RenderError::backend("lp", format!("failed to write payload: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RenderError::backend("lp", e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::backend(
                "lp",
                format!("lp exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(())
    }
}
