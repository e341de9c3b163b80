//! Job DTOs for the agent's local submission surface

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::job::{DocumentFormat, JobStatus, PrintJob};

/// Request to enqueue a print job on an agent
///
/// Exactly one of `content`, `data` or `document_path` should carry the
/// payload; when both bytes and text are present, bytes win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPrintJob {
    pub printer_name: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub document_path: Option<PathBuf>,
    #[serde(default)]
    pub landscape: bool,
    #[serde(default)]
    pub paper_size: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
}

impl SubmitPrintJob {
    /// Converts the request into a domain job, tagging its provenance.
    pub fn into_job(self, default_origin: &str) -> PrintJob {
        let mut job = PrintJob::new(self.printer_name, self.format);
        job.content = self.content;
        job.data = self.data;
        job.document_path = self.document_path;
        job.landscape = self.landscape;
        if let Some(size) = self.paper_size {
            job.paper_size = size;
        }
        job.submitted_by = self
            .submitted_by
            .unwrap_or_else(|| default_origin.to_string());
        job
    }
}

/// Acknowledgement of a successful enqueue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTicket {
    pub job_id: Uuid,
}

/// Best-effort status lookup result
///
/// `status` is None for ids the spooler no longer (or never) tracks; on the
/// wire that reads as the string "unknown".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub job_id: Uuid,
    #[serde(with = "status_or_unknown")]
    pub status: Option<JobStatus>,
}

mod status_or_unknown {
    use super::JobStatus;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        status: &Option<JobStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match status {
            Some(status) => serializer.serialize_str(&status.to_string()),
            None => serializer.serialize_str("unknown"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<JobStatus>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "unknown" {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_round_trip() {
        let report = JobStatusReport {
            job_id: Uuid::new_v4(),
            status: Some(JobStatus::Processing),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "processing");

        let unknown = JobStatusReport {
            job_id: Uuid::new_v4(),
            status: None,
        };
        let json = serde_json::to_value(&unknown).unwrap();
        assert_eq!(json["status"], "unknown");

        let parsed: JobStatusReport = serde_json::from_value(json).unwrap();
        assert!(parsed.status.is_none());
    }

    #[test]
    fn test_submit_into_job_defaults() {
        let req = SubmitPrintJob {
            printer_name: "HP-1".to_string(),
            format: DocumentFormat::PlainText,
            content: Some("hello".to_string()),
            data: None,
            document_path: None,
            landscape: false,
            paper_size: None,
            submitted_by: None,
        };

        let job = req.into_job("local-http");
        assert_eq!(job.printer_name, "HP-1");
        assert_eq!(job.paper_size, "A4");
        assert_eq!(job.submitted_by, "local-http");
        assert_eq!(job.status, JobStatus::Queued);
    }
}
