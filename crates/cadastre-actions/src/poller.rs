//! Authority client and remote log polling
//!
//! The authority is reachable only through an asynchronous, log-based
//! protocol: submitting a request returns an opaque ticket, and the result
//! document appears only after unpredictable delay. The poller turns that
//! into "one document per schedule, or not yet".

use crate::document::{ResultDocument, Ticket};
use crate::error::{ActionError, TransportError};
use crate::priority::PollSchedule;
use crate::record::ActionKind;
use cadastre_core::CatalogueId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A request submitted to the authority.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub catalogue_id: CatalogueId,
    pub username: String,
    /// Kind-specific payload, opaque on the wire.
    pub payload: String,
    /// Attached file content (uploads only).
    pub body: Option<Vec<u8>>,
}

/// The remote authority's request/poll surface. Only the contract is used
/// here; the wire format lives outside this crate.
#[async_trait::async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Submit a request; returns the correlation ticket immediately.
    async fn submit(&self, request: ActionRequest) -> Result<Ticket, TransportError>;

    /// One probe for the ticket's result document.
    async fn fetch_result(&self, ticket: &Ticket) -> Result<Option<ResultDocument>, TransportError>;
}

/// Retrieves a result document for a ticket under a backoff schedule.
#[async_trait::async_trait]
pub trait RemoteLogPoller: Send + Sync {
    /// Poll until a document appears, the schedule's attempts run out
    /// (`Ok(None)`), or the cancellation token fires.
    async fn poll(
        &self,
        ticket: &Ticket,
        schedule: PollSchedule,
        cancel: &CancellationToken,
    ) -> Result<Option<ResultDocument>, ActionError>;
}

/// Fixed-interval poller over an [`AuthorityClient`].
///
/// Sleeps between attempts (no busy-spin) and observes the cancellation
/// token at every poll boundary. Transport failures on a single probe are
/// logged and counted as a missed attempt rather than aborting the pass.
pub struct IntervalPoller {
    client: Arc<dyn AuthorityClient>,
}

impl IntervalPoller {
    #[must_use]
    pub fn new(client: Arc<dyn AuthorityClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RemoteLogPoller for IntervalPoller {
    async fn poll(
        &self,
        ticket: &Ticket,
        schedule: PollSchedule,
        cancel: &CancellationToken,
    ) -> Result<Option<ResultDocument>, ActionError> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ActionError::Cancelled);
            }
            match self.client.fetch_result(ticket).await {
                Ok(Some(document)) => {
                    tracing::debug!(%ticket, attempt, "result document available");
                    return Ok(Some(document));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%ticket, attempt, error = %err, "poll attempt failed");
                }
            }
            attempt += 1;
            if let Some(max) = schedule.attempts {
                if attempt >= max {
                    tracing::debug!(%ticket, attempts = max, "poll budget exhausted");
                    return Ok(None);
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(ActionError::Cancelled),
                _ = tokio::time::sleep(schedule.interval) => {}
            }
        }
    }
}
