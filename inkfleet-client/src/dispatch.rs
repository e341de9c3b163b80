//! Dispatch gateway endpoint

use crate::CoordinatorClient;
use crate::error::Result;
use inkfleet_core::dto::dispatch::{DispatchAck, DispatchRequest};

impl CoordinatorClient {
    /// Route a print request to a connected agent
    ///
    /// The returned acknowledgement means the coordinator handed the job to
    /// the agent's live connection; it is not a completion guarantee. The
    /// job id is assigned by the agent's spooler at enqueue and is not part
    /// of the ack.
    pub async fn dispatch_print(&self, req: &DispatchRequest) -> Result<DispatchAck> {
        let url = format!("{}/print/dispatch", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }
}
