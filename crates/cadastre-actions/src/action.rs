//! The pending-action protocol engine
//!
//! One `PendingAction` drives one in-flight remote operation from `Started`
//! to a terminal status on its own worker task. Within an action the
//! protocol is strictly sequential; the only suspension points are the
//! inter-attempt sleeps inside polling.

use crate::document::{LogOutcome, ResultDocument};
use crate::error::ActionError;
use crate::importer::{UpdateSource, VersionImporter};
use crate::listener::ActionListener;
use crate::poller::{AuthorityClient, RemoteLogPoller};
use crate::priority::{ActionConfig, Priority};
use crate::record::{ActionKind, PendingActionRecord};
use crate::status::{self, ActionStatus};
use crate::store::PendingActionStore;
use crate::variants;
use cadastre_core::CatalogueRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Every collaborator a pending action needs, passed explicitly instead of
/// reached through globals.
pub struct ActionEnvironment {
    pub registry: Arc<CatalogueRegistry>,
    pub store: Arc<dyn PendingActionStore>,
    pub poller: Arc<dyn RemoteLogPoller>,
    pub authority: Arc<dyn AuthorityClient>,
    pub importer: Arc<dyn VersionImporter>,
    pub updates: Arc<dyn UpdateSource>,
    pub listener: Arc<dyn ActionListener>,
    pub config: ActionConfig,
}

/// A nested action the variant wants submitted after this one terminates.
#[derive(Debug, Clone)]
pub struct FollowUpRequest {
    pub kind: ActionKind,
    pub payload: String,
    pub body: Option<Vec<u8>>,
}

/// What an action produced: the terminal classification, plus an optional
/// nested action.
#[derive(Debug)]
pub struct ActionResult {
    pub outcome: LogOutcome,
    pub follow_up: Option<FollowUpRequest>,
}

/// One in-flight remote operation and the state machine that drives it.
pub struct PendingAction {
    record: PendingActionRecord,
    env: Arc<ActionEnvironment>,
    cancel: CancellationToken,
    terminated: bool,
}

impl PendingAction {
    #[must_use]
    pub fn new(
        record: PendingActionRecord,
        env: Arc<ActionEnvironment>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            record,
            env,
            cancel,
            terminated: false,
        }
    }

    /// Current state of the persisted record.
    #[inline]
    #[must_use]
    pub fn record(&self) -> &PendingActionRecord {
        &self.record
    }

    #[inline]
    pub(crate) fn environment(&self) -> &ActionEnvironment {
        &self.env
    }

    /// Run the retry protocol to a terminal status.
    ///
    /// On success the record has been deleted from the store and the
    /// listener notified with the outcome. On failure (other than
    /// cancellation) the status is `Error` and the record is retained so
    /// the action can be re-issued after a restart.
    pub async fn send(&mut self) -> Result<ActionResult, ActionError> {
        let result = self.run().await;
        if let Err(err) = &result {
            match err {
                ActionError::Cancelled => {
                    tracing::info!(action = %self.record.id, "pending action cancelled");
                }
                _ => {
                    tracing::error!(action = %self.record.id, error = %err, "pending action failed");
                    self.fail().await;
                }
            }
        }
        result
    }

    async fn run(&mut self) -> Result<ActionResult, ActionError> {
        if self.record.status == ActionStatus::Started {
            self.env
                .listener
                .status_changed(&self.record, ActionStatus::Started);
            self.transition(ActionStatus::Sending).await?;
        } else {
            tracing::info!(
                action = %self.record.id,
                status = ?self.record.status,
                priority = ?self.record.priority,
                "resuming pending action"
            );
        }

        let document = self.obtain_document().await?;

        let outcome = match variants::extract_log_response(&self.record, &document) {
            Ok(outcome) => outcome,
            Err(err) => return self.handle_unreadable_document(err).await,
        };
        tracing::debug!(action = %self.record.id, %outcome, "result document classified");

        let follow_up = variants::process_response(self, outcome, &document).await?;
        self.terminate(outcome).await?;
        Ok(ActionResult { outcome, follow_up })
    }

    /// Poll until a result document appears.
    ///
    /// A high-priority pass that exhausts its budget triggers the busy
    /// fallback, the `Queued` status, and the one-time downgrade to the
    /// low-priority schedule, which then blocks until a document is
    /// obtained or the cancellation token fires.
    async fn obtain_document(&mut self) -> Result<ResultDocument, ActionError> {
        loop {
            let schedule = self.env.config.schedule(self.record.priority);
            let polled = self
                .env
                .poller
                .poll(&self.record.ticket, schedule, &self.cancel)
                .await?;
            match polled {
                Some(document) => return Ok(document),
                None if self.record.priority == Priority::High => {
                    tracing::info!(action = %self.record.id, "authority busy, queueing");
                    variants::manage_busy(self).await?;
                    self.transition(ActionStatus::Queued).await?;
                    self.downgrade().await?;
                }
                None => {
                    // An unbounded pass only returns without a document on a
                    // misbehaving poller; keep waiting rather than give up.
                    tracing::warn!(action = %self.record.id, "unbounded poll yielded nothing, retrying");
                }
            }
        }
    }

    /// One-way `High → Low` downgrade, persisted, at most once.
    async fn downgrade(&mut self) -> Result<(), ActionError> {
        if self.record.priority == Priority::Low {
            return Ok(());
        }
        self.record.priority = Priority::Low;
        self.env.store.update(&self.record).await?;
        tracing::debug!(action = %self.record.id, "poll priority downgraded to low");
        Ok(())
    }

    async fn handle_unreadable_document(
        &mut self,
        err: crate::error::DocumentError,
    ) -> Result<ActionResult, ActionError> {
        tracing::warn!(action = %self.record.id, error = %err, "result document unreadable");
        self.transition(ActionStatus::InvalidResponse).await?;
        let catalogue = self.env.registry.get(self.record.catalogue_id).await?;
        if catalogue.version.is_forced() {
            self.env.registry.invalidate(self.record.catalogue_id).await?;
        }
        self.terminate(LogOutcome::Pending).await?;
        Ok(ActionResult {
            outcome: LogOutcome::Pending,
            follow_up: None,
        })
    }

    /// Move to a new status, persist it, notify the listener.
    pub(crate) async fn transition(&mut self, to: ActionStatus) -> Result<(), ActionError> {
        status::validate_transition(self.record.status, to)?;
        self.record.status = to;
        self.env.store.update(&self.record).await?;
        self.env.listener.status_changed(&self.record, to);
        Ok(())
    }

    /// Delete the record and report the outcome. The sole deletion path;
    /// a second call is a no-op.
    pub(crate) async fn terminate(&mut self, outcome: LogOutcome) -> Result<(), ActionError> {
        if self.terminated {
            tracing::debug!(action = %self.record.id, "terminate called twice, ignoring");
            return Ok(());
        }
        status::validate_transition(self.record.status, ActionStatus::Completed)?;
        self.env.store.delete(self.record.id).await?;
        self.terminated = true;
        self.record.status = ActionStatus::Completed;
        self.record.outcome = Some(outcome);
        self.env
            .listener
            .status_changed(&self.record, ActionStatus::Completed);
        self.env.listener.response_received(&self.record, outcome);
        tracing::info!(action = %self.record.id, %outcome, "pending action completed");
        Ok(())
    }

    /// Best-effort move to `Error`. The record is retained; recovery is a
    /// re-issue from persisted state on the next startup.
    async fn fail(&mut self) {
        if self.terminated || self.record.status.is_terminal() {
            return;
        }
        self.record.status = ActionStatus::Error;
        if let Err(err) = self.env.store.update(&self.record).await {
            tracing::warn!(action = %self.record.id, error = %err, "could not persist error status");
        }
        self.env
            .listener
            .status_changed(&self.record, ActionStatus::Error);
    }
}
