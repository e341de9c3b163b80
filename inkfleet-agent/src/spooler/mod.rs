//! Print Spooler
//!
//! Durable in-process queue of print jobs with a single-consumer processing
//! loop. Any number of producers may enqueue concurrently; exactly one job
//! at a time holds the exclusive print lock around the entire render call,
//! because the underlying device layer is not safe for concurrent access.
//!
//! Jobs are processed in FIFO enqueue order. The loop is push-driven (a
//! channel recv instead of fixed-interval polling) and never exits except
//! through `stop()`, which drains exactly the in-flight job. Per-job
//! failures are terminal and recorded; the spooler never retries — a retry
//! is a fresh enqueue by the caller.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use inkfleet_core::domain::job::{JobStatus, PrintJob};

use crate::render::{RenderDispatcher, RenderRequest};
use crate::store::{DocumentStore, StoreError};

/// Terminal statuses kept for later lookup before eviction.
const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Errors rejected synchronously at enqueue time
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("job has no printer name")]
    MissingPrinter,

    #[error("job carries no payload (content, data, path and spool file all absent)")]
    EmptyPayload,

    #[error("spooler is stopped")]
    Stopped,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Spooler tuning knobs
#[derive(Debug, Clone)]
pub struct SpoolerOptions {
    /// How many terminal job statuses to retain for `status()` lookups
    pub history_limit: usize,
}

impl Default for SpoolerOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// The print spooler: concurrent producers, one consumer, one device
pub struct PrintSpooler {
    tx: mpsc::UnboundedSender<PrintJob>,
    statuses: Arc<StdMutex<StatusTable>>,
    store: Arc<DocumentStore>,
    shutdown: watch::Sender<bool>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl PrintSpooler {
    /// Starts a spooler and its processing loop.
    pub fn start(store: Arc<DocumentStore>, renderer: Arc<RenderDispatcher>) -> Self {
        Self::start_with_options(store, renderer, SpoolerOptions::default())
    }

    pub fn start_with_options(
        store: Arc<DocumentStore>,
        renderer: Arc<RenderDispatcher>,
        options: SpoolerOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let statuses = Arc::new(StdMutex::new(StatusTable::new(options.history_limit)));

        let worker = Worker {
            rx,
            statuses: Arc::clone(&statuses),
            store: Arc::clone(&store),
            renderer,
            print_lock: Mutex::new(()),
            shutdown: shutdown_rx,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            tx,
            statuses,
            store,
            shutdown,
            worker: StdMutex::new(Some(handle)),
        }
    }

    /// Accepts a job into the queue and returns its id immediately.
    ///
    /// Suspends only while spilling an oversized payload to the document
    /// store; never waits on the processing loop. Caller contract
    /// violations (no printer, no payload) are rejected here and never
    /// enter the queue.
    pub async fn enqueue(&self, mut job: PrintJob) -> Result<Uuid, SpoolError> {
        if *self.shutdown.borrow() {
            return Err(SpoolError::Stopped);
        }
        if job.printer_name.trim().is_empty() {
            return Err(SpoolError::MissingPrinter);
        }
        if !job.has_payload() {
            return Err(SpoolError::EmptyPayload);
        }

        if job.id.is_nil() {
            job.id = Uuid::new_v4();
        }

        self.spill_payload(&mut job).await?;

        job.status = JobStatus::Queued;
        job.queued_at = Some(chrono::Utc::now());

        let job_id = job.id;
        self.statuses
            .lock()
            .expect("status table lock poisoned")
            .set(job_id, JobStatus::Queued);

        if self.tx.send(job).is_err() {
            self.statuses
                .lock()
                .expect("status table lock poisoned")
                .forget(job_id);
            return Err(SpoolError::Stopped);
        }

        tracing::debug!("Enqueued print job {}", job_id);
        Ok(job_id)
    }

    /// Best-effort status lookup; None for ids the spooler does not track.
    pub fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.statuses
            .lock()
            .expect("status table lock poisoned")
            .get(job_id)
    }

    /// Signals the processing loop to exit after the in-flight job finishes
    /// and waits for it to terminate. Queued-but-unstarted jobs are dropped.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);

        let handle = self
            .worker
            .lock()
            .expect("worker handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("Spooler worker task ended abnormally: {}", e);
            }
        }
    }

    /// Spills a raw byte payload to the document store and clears it from
    /// the in-memory job, so the bytes are gone before the job becomes
    /// visible in the queue. Bytes win over inline text when both are set.
    async fn spill_payload(&self, job: &mut PrintJob) -> Result<(), SpoolError> {
        let Some(data) = job.data.take() else {
            return Ok(());
        };
        if data.is_empty() {
            return Ok(());
        }

        let path = self.store.persist(job.id, job.format, &data).await?;
        job.spool_file = Some(path);
        job.content = None;
        Ok(())
    }
}

// =============================================================================
// Status tracking
// =============================================================================

/// In-memory job status index with a bounded terminal-status history
struct StatusTable {
    statuses: HashMap<Uuid, JobStatus>,
    terminal_order: VecDeque<Uuid>,
    history_limit: usize,
}

impl StatusTable {
    fn new(history_limit: usize) -> Self {
        Self {
            statuses: HashMap::new(),
            terminal_order: VecDeque::new(),
            history_limit: history_limit.max(1),
        }
    }

    fn set(&mut self, job_id: Uuid, status: JobStatus) {
        self.statuses.insert(job_id, status);

        if status.is_terminal() {
            self.terminal_order.push_back(job_id);
            while self.terminal_order.len() > self.history_limit {
                if let Some(evicted) = self.terminal_order.pop_front() {
                    self.statuses.remove(&evicted);
                }
            }
        }
    }

    fn get(&self, job_id: Uuid) -> Option<JobStatus> {
        self.statuses.get(&job_id).copied()
    }

    fn forget(&mut self, job_id: Uuid) {
        self.statuses.remove(&job_id);
    }
}

// =============================================================================
// Processing loop
// =============================================================================

struct Worker {
    rx: mpsc::UnboundedReceiver<PrintJob>,
    statuses: Arc<StdMutex<StatusTable>>,
    store: Arc<DocumentStore>,
    renderer: Arc<RenderDispatcher>,
    /// The exclusive print lock: at most one render call system-wide
    print_lock: Mutex<()>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        tracing::info!("Print spooler processing loop started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                job = self.rx.recv() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => break,
                    }
                }
            }
        }

        tracing::info!("Print spooler processing loop stopped");
    }

    /// Runs one job to a terminal status. Every failure is caught and
    /// recorded on the job; a bad job never stops the loop.
    async fn process(&self, mut job: PrintJob) {
        let job_id = job.id;
        self.set_status(job_id, JobStatus::Processing);
        tracing::info!(
            "Processing print job {} for printer {} ({})",
            job_id,
            job.printer_name,
            job.format
        );

        let outcome = {
            // Held across the entire render call: the device layer is not
            // safe for concurrent access.
            let _device = self.print_lock.lock().await;
            self.render_job(&job).await
        };

        match outcome {
            Ok(()) => {
                self.set_status(job_id, JobStatus::Completed);
                tracing::info!("Print job {} completed", job_id);
            }
            Err(e) => {
                // Terminal for this job only; the next job starts untaxed.
                let message = format!("{:#}", e);
                tracing::warn!("Print job {} failed: {}", job_id, message);
                job.error_message = Some(message);
                self.set_status(job_id, JobStatus::Failed);
            }
        }

        // Spool file cleanup happens regardless of outcome.
        if let Some(path) = job.spool_file.take() {
            self.store.remove(&path).await;
        }
    }

    /// Resolves the payload and dispatches it to the render chain.
    async fn render_job(&self, job: &PrintJob) -> anyhow::Result<()> {
        let bytes = self.resolve_payload(job).await?;

        self.renderer
            .render(RenderRequest {
                printer_name: job.printer_name.clone(),
                format: job.format,
                bytes,
                text: job.content.clone(),
                landscape: job.landscape,
                paper_size: job.effective_paper_size().to_string(),
            })
            .await?;

        Ok(())
    }

    /// Payload precedence: spool file, then caller-supplied path, then
    /// in-memory bytes, then inline text.
    async fn resolve_payload(&self, job: &PrintJob) -> anyhow::Result<Vec<u8>> {
        if let Some(path) = &job.spool_file {
            return tokio::fs::read(path).await.map_err(|e| {
                anyhow::anyhow!("failed to read spool file {}: {}", path.display(), e)
            });
        }
        if let Some(path) = &job.document_path {
            return tokio::fs::read(path).await.map_err(|e| {
                anyhow::anyhow!("failed to read document {}: {}", path.display(), e)
            });
        }
        if let Some(data) = &job.data {
            if !data.is_empty() {
                return Ok(data.clone());
            }
        }
        if let Some(content) = &job.content {
            if !content.is_empty() {
                return Ok(content.clone().into_bytes());
            }
        }

        // Unreachable through enqueue validation, but a caller contract
        // violation if it happens: fail the job descriptively.
        anyhow::bail!("job has no payload (content, data, path and spool file all absent)")
    }

    fn set_status(&self, job_id: Uuid, status: JobStatus) {
        self.statuses
            .lock()
            .expect("status table lock poisoned")
            .set(job_id, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::StubBackend;
    use inkfleet_core::domain::job::DocumentFormat;
    use std::time::{Duration, Instant};

    async fn spooler_with(
        backend: Arc<StubBackend>,
        options: SpoolerOptions,
    ) -> (PrintSpooler, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::open(dir.path()).await.unwrap());
        let renderer = Arc::new(RenderDispatcher::new(vec![backend]));
        (
            PrintSpooler::start_with_options(store, renderer, options),
            dir,
        )
    }

    fn text_job(printer: &str, content: &str) -> PrintJob {
        let mut job = PrintJob::new(printer, DocumentFormat::PlainText);
        job.content = Some(content.to_string());
        job
    }

    async fn wait_for_terminal(spooler: &PrintSpooler, job_id: Uuid) -> JobStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(status) = spooler.status(job_id) {
                if status.is_terminal() {
                    return status;
                }
            }
            assert!(Instant::now() < deadline, "job {} never finished", job_id);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_enqueue_then_complete() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, dir) = spooler_with(backend.clone(), SpoolerOptions::default()).await;

        let job_id = spooler.enqueue(text_job("HP-1", "hello")).await.unwrap();
        // Visible immediately, before the loop touches it or right after.
        assert!(spooler.status(job_id).is_some());

        assert_eq!(wait_for_terminal(&spooler, job_id).await, JobStatus::Completed);
        assert_eq!(backend.printer_names(), vec!["HP-1"]);

        // No spool file was needed for inline text; directory stays empty.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fifo_dispatch_order() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend.clone(), SpoolerOptions::default()).await;

        let mut ids = Vec::new();
        for i in 0..5 {
            let id = spooler
                .enqueue(text_job(&format!("printer-{}", i), "x"))
                .await
                .unwrap();
            ids.push(id);
        }

        for id in &ids {
            wait_for_terminal(&spooler, *id).await;
        }

        let expected: Vec<String> = (0..5).map(|i| format!("printer-{}", i)).collect();
        assert_eq!(backend.printer_names(), expected);
    }

    #[tokio::test]
    async fn test_render_never_overlaps_under_concurrent_enqueue() {
        let backend = Arc::new(StubBackend::slow(Duration::from_millis(10)));
        let (spooler, _dir) = spooler_with(backend.clone(), SpoolerOptions::default()).await;
        let spooler = Arc::new(spooler);

        let mut handles = Vec::new();
        for i in 0..8 {
            let spooler = Arc::clone(&spooler);
            handles.push(tokio::spawn(async move {
                spooler
                    .enqueue(text_job(&format!("p{}", i), "x"))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        for id in ids {
            wait_for_terminal(&spooler, id).await;
        }

        assert!(!backend.overlapped.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(backend.printed.lock().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_large_payload_spills_before_queue_visibility() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let mut job = PrintJob::new("HP-1", DocumentFormat::Raw);
        job.data = Some(vec![7u8; 1024 * 1024]);
        job.content = Some("stale text".to_string());

        // The spill step itself: bytes leave memory, a spool file appears,
        // and the stale text payload is dropped (bytes win over text).
        spooler.spill_payload(&mut job).await.unwrap();
        assert!(job.data.is_none());
        assert!(job.content.is_none());
        let spool_file = job.spool_file.clone().expect("payload should be spooled");
        assert!(spool_file.exists());
    }

    #[tokio::test]
    async fn test_spool_file_removed_after_terminal_status() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let mut job = PrintJob::new("HP-1", DocumentFormat::Pdf);
        job.data = Some(vec![1u8; 4096]);
        let job_id = spooler.enqueue(job).await.unwrap();

        assert_eq!(wait_for_terminal(&spooler, job_id).await, JobStatus::Completed);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_spool_file_removed_after_failure_too() {
        let backend = Arc::new(StubBackend::failing("out of toner"));
        let (spooler, dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let mut job = PrintJob::new("HP-1", DocumentFormat::Pdf);
        job.data = Some(vec![1u8; 4096]);
        let job_id = spooler.enqueue(job).await.unwrap();

        assert_eq!(wait_for_terminal(&spooler, job_id).await, JobStatus::Failed);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_render_is_terminal_and_loop_continues() {
        let backend = Arc::new(StubBackend::failing("device busy"));
        let (spooler, _dir) = spooler_with(backend.clone(), SpoolerOptions::default()).await;

        let first = spooler.enqueue(text_job("HP-1", "a")).await.unwrap();
        let second = spooler.enqueue(text_job("HP-1", "b")).await.unwrap();

        assert_eq!(wait_for_terminal(&spooler, first).await, JobStatus::Failed);
        assert_eq!(wait_for_terminal(&spooler, second).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_delay_the_next() {
        let backend = Arc::new(StubBackend::failing("device busy"));
        let (spooler, _dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let first = spooler.enqueue(text_job("HP-1", "a")).await.unwrap();
        let second = spooler.enqueue(text_job("HP-1", "b")).await.unwrap();

        wait_for_terminal(&spooler, first).await;
        let after_first = Instant::now();
        wait_for_terminal(&spooler, second).await;

        // Failure is terminal for its own job only; the queue moves straight
        // on to the next one.
        assert!(after_first.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_unreadable_document_path_fails_the_job() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let mut job = PrintJob::new("HP-1", DocumentFormat::Pdf);
        job.document_path = Some("/no/such/file.pdf".into());
        let job_id = spooler.enqueue(job).await.unwrap();

        assert_eq!(wait_for_terminal(&spooler, job_id).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_contract_violations_rejected_at_enqueue() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend.clone(), SpoolerOptions::default()).await;

        let err = spooler.enqueue(text_job("", "hello")).await.unwrap_err();
        assert!(matches!(err, SpoolError::MissingPrinter));

        let err = spooler
            .enqueue(PrintJob::new("HP-1", DocumentFormat::PlainText))
            .await
            .unwrap_err();
        assert!(matches!(err, SpoolError::EmptyPayload));

        // Nothing reached the backend.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(backend.printed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_of_unknown_id_is_none() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend, SpoolerOptions::default()).await;

        assert!(spooler.status(Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_terminal_history_is_bounded() {
        let backend = Arc::new(StubBackend::new());
        let options = SpoolerOptions { history_limit: 2 };
        let (spooler, _dir) = spooler_with(backend, options).await;

        let first = spooler.enqueue(text_job("HP-1", "a")).await.unwrap();
        let second = spooler.enqueue(text_job("HP-1", "b")).await.unwrap();
        let third = spooler.enqueue(text_job("HP-1", "c")).await.unwrap();

        wait_for_terminal(&spooler, third).await;

        // Oldest terminal entry evicted; the newest two remain.
        assert!(spooler.status(first).is_none());
        assert_eq!(spooler.status(second), Some(JobStatus::Completed));
        assert_eq!(spooler.status(third), Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn test_stop_drains_and_rejects_new_work() {
        let backend = Arc::new(StubBackend::new());
        let (spooler, _dir) = spooler_with(backend, SpoolerOptions::default()).await;

        let job_id = spooler.enqueue(text_job("HP-1", "hello")).await.unwrap();
        wait_for_terminal(&spooler, job_id).await;

        spooler.stop().await;

        let err = spooler.enqueue(text_job("HP-1", "late")).await.unwrap_err();
        assert!(matches!(err, SpoolError::Stopped));
    }
}
