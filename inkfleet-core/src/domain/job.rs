//! Print job domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Paper size used when a job does not specify one.
pub const DEFAULT_PAPER_SIZE: &str = "A4";

/// A unit of print work
///
/// Structure shared between the coordinator (dispatches) and the agent
/// (spools and renders). Exactly one payload source is authoritative at a
/// time: once raw `data` has been spilled to a spool file it is cleared from
/// the in-memory job, so large uploads never sit in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: Uuid,
    pub printer_name: String,
    pub format: DocumentFormat,
    /// Inline text payload (plain text / RTF source)
    pub content: Option<String>,
    /// Raw byte payload; spilled to a spool file before the job is queued
    pub data: Option<Vec<u8>>,
    /// Caller-supplied on-disk payload
    pub document_path: Option<PathBuf>,
    pub landscape: bool,
    pub paper_size: String,
    pub status: JobStatus,
    pub queued_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error_message: Option<String>,
    /// Set when the payload was persisted by the document store; removed
    /// after processing regardless of outcome
    pub spool_file: Option<PathBuf>,
    /// Provenance tag for audit/debugging (which entry point created the job)
    pub submitted_by: String,
}

impl PrintJob {
    /// Creates a job for the given printer and format with no payload.
    pub fn new(printer_name: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            printer_name: printer_name.into(),
            format,
            content: None,
            data: None,
            document_path: None,
            landscape: false,
            paper_size: DEFAULT_PAPER_SIZE.to_string(),
            status: JobStatus::Queued,
            queued_at: None,
            error_message: None,
            spool_file: None,
            submitted_by: String::new(),
        }
    }

    /// True if any payload source is present.
    pub fn has_payload(&self) -> bool {
        self.spool_file.is_some()
            || self.document_path.is_some()
            || self.data.as_ref().is_some_and(|d| !d.is_empty())
            || self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Effective paper size, falling back to the default when unset/blank.
    pub fn effective_paper_size(&self) -> &str {
        if self.paper_size.trim().is_empty() {
            DEFAULT_PAPER_SIZE
        } else {
            &self.paper_size
        }
    }
}

/// Document payload format
///
/// A closed tag set: determines the render path and the spool file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Rtf,
    Pdf,
    Xps,
    Image,
    Office,
    Raw,
}

impl DocumentFormat {
    /// Spool file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Xps => "xps",
            DocumentFormat::Image | DocumentFormat::Office | DocumentFormat::Raw => "bin",
        }
    }

    /// True for formats rendered through the dedicated text path.
    pub fn is_text(&self) -> bool {
        matches!(self, DocumentFormat::PlainText | DocumentFormat::Rtf)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentFormat::PlainText => "plain-text",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Xps => "xps",
            DocumentFormat::Image => "image",
            DocumentFormat::Office => "office",
            DocumentFormat::Raw => "raw",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain_text" | "plain-text" | "text" | "txt" => Ok(DocumentFormat::PlainText),
            "rtf" => Ok(DocumentFormat::Rtf),
            "pdf" => Ok(DocumentFormat::Pdf),
            "xps" => Ok(DocumentFormat::Xps),
            "image" => Ok(DocumentFormat::Image),
            "office" => Ok(DocumentFormat::Office),
            "raw" => Ok(DocumentFormat::Raw),
            other => Err(format!("unknown document format: {}", other)),
        }
    }
}

/// Lifecycle status of a tracked print job
///
/// `Queued -> Processing -> {Completed | Failed}`. `Canceled` is a modeled
/// terminal state reserved for future cancellation support; nothing produces
/// it today. An untracked id is reported as "unknown" at the API edge rather
/// than modeled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "canceled" => Ok(JobStatus::Canceled),
            other => Err(format!("unrecognized job status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(DocumentFormat::PlainText.extension(), "txt");
        assert_eq!(DocumentFormat::Rtf.extension(), "rtf");
        assert_eq!(DocumentFormat::Pdf.extension(), "pdf");
        assert_eq!(DocumentFormat::Xps.extension(), "xps");
        assert_eq!(DocumentFormat::Image.extension(), "bin");
        assert_eq!(DocumentFormat::Office.extension(), "bin");
        assert_eq!(DocumentFormat::Raw.extension(), "bin");
    }

    #[test]
    fn test_paper_size_defaults() {
        let mut job = PrintJob::new("HP-1", DocumentFormat::PlainText);
        assert_eq!(job.effective_paper_size(), "A4");

        job.paper_size = "  ".to_string();
        assert_eq!(job.effective_paper_size(), "A4");

        job.paper_size = "Letter".to_string();
        assert_eq!(job.effective_paper_size(), "Letter");
    }

    #[test]
    fn test_has_payload() {
        let mut job = PrintJob::new("HP-1", DocumentFormat::PlainText);
        assert!(!job.has_payload());

        job.content = Some(String::new());
        assert!(!job.has_payload());

        job.content = Some("hello".to_string());
        assert!(job.has_payload());

        let mut job = PrintJob::new("HP-1", DocumentFormat::Raw);
        job.data = Some(vec![]);
        assert!(!job.has_payload());
        job.data = Some(vec![1, 2, 3]);
        assert!(job.has_payload());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
    }
}
