//! Dispatch DTOs
//!
//! Shapes crossing the coordinator boundary: the inbound print request from
//! external callers and the wire message forwarded to an agent's live
//! connection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{DocumentFormat, PrintJob};

/// Inbound print request handled by the dispatch gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub agent_id: String,
    pub printer_name: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub landscape: bool,
    #[serde(default)]
    pub paper_size: Option<String>,
}

impl DispatchRequest {
    /// True if the request carries any payload at all.
    pub fn has_payload(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
            || self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Wire message sent coordinator -> agent over the live connection
///
/// Delivery is at-most-once; the receiving agent's spooler assigns the job
/// id at enqueue, the gateway never pre-assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintDispatch {
    pub agent_id: String,
    pub machine_name: String,
    pub printer_name: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<u8>>,
    pub landscape: bool,
    pub paper_size: String,
    pub location: String,
}

impl PrintDispatch {
    /// Converts the wire message into a local job on the receiving agent.
    pub fn into_job(self) -> PrintJob {
        let mut job = PrintJob::new(self.printer_name, self.format);
        job.content = self.content;
        job.data = self.data;
        job.landscape = self.landscape;
        if !self.paper_size.trim().is_empty() {
            job.paper_size = self.paper_size;
        }
        job.submitted_by = "coordinator-dispatch".to_string();
        job
    }
}

/// Gateway acknowledgement returned to the caller
///
/// An accepted dispatch is a routing guarantee only, never a completion
/// guarantee; `printer_known` is advisory (printers can appear and disappear
/// between heartbeats).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAck {
    pub ack_id: Uuid,
    pub agent_id: String,
    pub printer_known: bool,
}
