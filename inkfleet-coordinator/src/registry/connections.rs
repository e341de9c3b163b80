//! Connection Table
//!
//! Models the live coordinator->agent connection as a per-connection mailbox
//! of dispatch envelopes. Transport framing is a delivery concern handled at
//! the HTTP edge (long-poll drain); the gateway only ever talks to this
//! table. Closing a connection drops its sender, so a waiting drain call
//! observes the channel end and reports the connection gone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use inkfleet_core::dto::dispatch::PrintDispatch;

/// Failure modes when talking to a live connection
#[derive(Debug, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection id is unknown, closed or superseded
    Gone,
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Gone => write!(f, "connection is gone"),
        }
    }
}

struct Connection {
    tx: mpsc::UnboundedSender<PrintDispatch>,
    // Mutex so only one drain call reads a given mailbox at a time.
    rx: Arc<Mutex<mpsc::UnboundedReceiver<PrintDispatch>>>,
}

/// Table of live agent connections, keyed by connection id
#[derive(Default)]
pub struct ConnectionTable {
    inner: RwLock<HashMap<String, Connection>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh connection and returns its id.
    pub async fn open(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.insert(
            id.clone(),
            Connection {
                tx,
                rx: Arc::new(Mutex::new(rx)),
            },
        );
        id
    }

    /// Closes a connection, dropping any undelivered envelopes.
    pub async fn close(&self, connection_id: &str) -> bool {
        self.inner.write().await.remove(connection_id).is_some()
    }

    /// Sends a dispatch envelope into a connection's mailbox.
    pub async fn send(
        &self,
        connection_id: &str,
        dispatch: PrintDispatch,
    ) -> Result<(), ConnectionError> {
        let inner = self.inner.read().await;
        let connection = inner.get(connection_id).ok_or(ConnectionError::Gone)?;
        connection
            .tx
            .send(dispatch)
            .map_err(|_| ConnectionError::Gone)
    }

    /// Waits up to `wait` for the next envelope on a connection.
    ///
    /// Ok(None) means the wait elapsed with an empty mailbox; Err(Gone)
    /// means the connection no longer exists (closed or superseded).
    pub async fn next(
        &self,
        connection_id: &str,
        wait: Duration,
    ) -> Result<Option<PrintDispatch>, ConnectionError> {
        let rx = {
            let inner = self.inner.read().await;
            let connection = inner.get(connection_id).ok_or(ConnectionError::Gone)?;
            Arc::clone(&connection.rx)
        };

        let mut rx = rx.lock().await;
        match tokio::time::timeout(wait, rx.recv()).await {
            Ok(Some(dispatch)) => Ok(Some(dispatch)),
            Ok(None) => Err(ConnectionError::Gone),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkfleet_core::domain::job::DocumentFormat;

    fn dispatch(printer: &str) -> PrintDispatch {
        PrintDispatch {
            agent_id: "agent-1".to_string(),
            machine_name: "HOST1".to_string(),
            printer_name: printer.to_string(),
            format: DocumentFormat::PlainText,
            content: Some("hello".to_string()),
            data: None,
            landscape: false,
            paper_size: "A4".to_string(),
            location: String::new(),
        }
    }

    #[tokio::test]
    async fn test_send_then_drain() {
        let table = ConnectionTable::new();
        let id = table.open().await;

        table.send(&id, dispatch("HP-1")).await.unwrap();
        table.send(&id, dispatch("HP-2")).await.unwrap();

        let first = table.next(&id, Duration::from_millis(50)).await.unwrap();
        let second = table.next(&id, Duration::from_millis(50)).await.unwrap();
        assert_eq!(first.unwrap().printer_name, "HP-1");
        assert_eq!(second.unwrap().printer_name, "HP-2");

        // Empty mailbox: the wait elapses without an envelope.
        let third = table.next(&id, Duration::from_millis(10)).await.unwrap();
        assert!(third.is_none());
    }

    #[tokio::test]
    async fn test_closed_connection_is_gone() {
        let table = ConnectionTable::new();
        let id = table.open().await;
        assert!(table.close(&id).await);

        assert_eq!(
            table.send(&id, dispatch("HP-1")).await,
            Err(ConnectionError::Gone)
        );
        assert_eq!(
            table.next(&id, Duration::from_millis(10)).await,
            Err(ConnectionError::Gone)
        );
    }
}
