//! Render backends
//!
//! The spooler treats rendering as an opaque, potentially slow, potentially
//! failing black box behind a single narrow contract. Plain text and RTF go
//! through the dedicated text path (the payload is decoded to UTF-8 before
//! any backend sees it); every other format is handed to an ordered chain
//! of backends, tried in sequence until one succeeds. The chain is chosen
//! by configuration, so the spooler never knows which concrete strategy ran.

mod file_sink;
mod lp;

pub use file_sink::FileSinkBackend;
pub use lp::LpCommandBackend;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use inkfleet_core::domain::job::DocumentFormat;

/// Everything a backend needs to produce output on a device
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub printer_name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
    /// Decoded payload for the text path; None for binary formats
    pub text: Option<String>,
    pub landscape: bool,
    pub paper_size: String,
}

/// Render failure surfaced to the spooler
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no render backend supports format {0}")]
    Unsupported(DocumentFormat),

    #[error("{backend}: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
}

impl RenderError {
    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        RenderError::Backend {
            backend,
            message: message.into(),
        }
    }
}

/// Contract every rendering strategy implements
#[async_trait]
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, format: DocumentFormat) -> bool;

    async fn print(&self, req: &RenderRequest) -> Result<(), RenderError>;
}

/// Ordered chain of render backends with a uniform result contract
pub struct RenderDispatcher {
    chain: Vec<Arc<dyn RenderBackend>>,
}

impl RenderDispatcher {
    pub fn new(chain: Vec<Arc<dyn RenderBackend>>) -> Self {
        Self { chain }
    }

    /// Builds the chain from configured backend names.
    ///
    /// Known names: "lp" (CUPS `lp` command) and "file" (write output files
    /// under `output_dir`, the development default).
    pub fn from_config(names: &[String], output_dir: &Path) -> anyhow::Result<Self> {
        let mut chain: Vec<Arc<dyn RenderBackend>> = Vec::new();

        for name in names {
            match name.as_str() {
                "lp" => chain.push(Arc::new(LpCommandBackend::new())),
                "file" => chain.push(Arc::new(FileSinkBackend::new(output_dir)?)),
                other => anyhow::bail!("unknown render backend: {}", other),
            }
        }

        if chain.is_empty() {
            anyhow::bail!("at least one render backend must be configured");
        }

        Ok(Self::new(chain))
    }

    /// Renders a request through the chain.
    ///
    /// Text formats are decoded before dispatch so backends only ever see a
    /// ready-to-print text payload on that path. A backend failure falls
    /// through to the next backend in order; the last error wins.
    pub async fn render(&self, mut req: RenderRequest) -> Result<(), RenderError> {
        if req.format.is_text() && req.text.is_none() {
            req.text = Some(String::from_utf8_lossy(&req.bytes).into_owned());
        }

        let mut last_error = None;

        for backend in &self.chain {
            if !backend.supports(req.format) {
                continue;
            }

            match backend.print(&req).await {
                Ok(()) => {
                    tracing::debug!(
                        "Rendered {} job on printer {} via {}",
                        req.format,
                        req.printer_name,
                        backend.name()
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Render backend {} failed for printer {}: {}",
                        backend.name(),
                        req.printer_name,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(RenderError::Unsupported(req.format)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Records every invocation; configurable failure and per-call delay.
    /// Flags overlapping invocations, which the exclusive print lock must
    /// make impossible.
    pub struct StubBackend {
        pub printed: Mutex<Vec<RenderRequest>>,
        pub fail_with: Option<String>,
        pub delay: Duration,
        in_flight: AtomicBool,
        pub overlapped: AtomicBool,
    }

    impl StubBackend {
        pub fn new() -> Self {
            Self {
                printed: Mutex::new(Vec::new()),
                fail_with: None,
                delay: Duration::ZERO,
                in_flight: AtomicBool::new(false),
                overlapped: AtomicBool::new(false),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::new()
            }
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        pub fn printer_names(&self) -> Vec<String> {
            self.printed
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.printer_name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RenderBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn supports(&self, _format: DocumentFormat) -> bool {
            true
        }

        async fn print(&self, req: &RenderRequest) -> Result<(), RenderError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.printed.lock().unwrap().push(req.clone());
            self.in_flight.store(false, Ordering::SeqCst);

            match &self.fail_with {
                Some(message) => Err(RenderError::backend("stub", message.clone())),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubBackend;
    use super::*;

    fn text_request(content: &str) -> RenderRequest {
        RenderRequest {
            printer_name: "HP-1".to_string(),
            format: DocumentFormat::PlainText,
            bytes: content.as_bytes().to_vec(),
            text: None,
            landscape: false,
            paper_size: "A4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_text_path_decodes_before_dispatch() {
        let stub = Arc::new(StubBackend::new());
        let dispatcher = RenderDispatcher::new(vec![stub.clone()]);

        dispatcher.render(text_request("hello")).await.unwrap();

        let printed = stub.printed.lock().unwrap();
        assert_eq!(printed[0].text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_backend() {
        let failing = Arc::new(StubBackend::failing("device busy"));
        let working = Arc::new(StubBackend::new());
        let dispatcher = RenderDispatcher::new(vec![failing.clone(), working.clone()]);

        dispatcher.render(text_request("hello")).await.unwrap();

        assert_eq!(failing.printed.lock().unwrap().len(), 1);
        assert_eq!(working.printed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_backends_failing_surfaces_last_error() {
        let dispatcher =
            RenderDispatcher::new(vec![Arc::new(StubBackend::failing("out of paper"))]);

        let err = dispatcher.render(text_request("hello")).await.unwrap_err();
        assert!(err.to_string().contains("out of paper"));
    }

    #[tokio::test]
    async fn test_empty_chain_is_unsupported() {
        let dispatcher = RenderDispatcher::new(vec![]);
        let err = dispatcher.render(text_request("hello")).await.unwrap_err();
        assert!(matches!(err, RenderError::Unsupported(_)));
    }

    #[test]
    fn test_from_config_rejects_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenderDispatcher::from_config(&["teleport".to_string()], dir.path());
        assert!(result.is_err());
    }
}
