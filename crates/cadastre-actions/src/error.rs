//! Error types for the pending-action protocol
//!
//! Authority rejections are not errors: `Forbidden`/`Pending` outcomes are
//! normal terminal classifications routed through the variants. The types
//! here cover transport, storage and protocol faults.

use crate::status::ActionStatus;
use cadastre_core::CoreError;

/// Main error type for the pending-action protocol.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Network or remote-service failure.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Pending-action store failure.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Catalogue state transition failed.
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CoreError),

    /// Result document could not be interpreted.
    #[error("malformed result document: {0}")]
    Document(#[from] DocumentError),

    /// Status transition not allowed by the state machine.
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ActionStatus,
        to: ActionStatus,
    },

    /// The action's cancellation token fired at a poll boundary.
    #[error("operation cancelled")]
    Cancelled,

    /// The worker task died without producing a result.
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl ActionError {
    /// Whether the persisted record survives this failure for re-issue.
    ///
    /// Termination is the only deletion path, so every error leaves the
    /// record in place; cancellation additionally leaves the remote ticket
    /// open so a resumed action can still redeem it.
    #[inline]
    #[must_use]
    pub fn retains_record(&self) -> bool {
        true
    }

    /// Whether re-issuing the action from its persisted record can succeed.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ActionError::Transport(_) | ActionError::Cancelled | ActionError::Store(_)
        )
    }
}

/// Network-level failures talking to the authority or fetching imports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("remote rejected request: {0}")]
    Rejected(String),
}

/// Failures of the durable pending-action store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("no pending action with id {0}")]
    NotFound(String),
}

/// A result document missing or garbling the fields a variant needs.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unreadable payload: {0}")]
    Payload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_recoverable() {
        assert!(ActionError::Cancelled.is_recoverable());
        assert!(ActionError::Transport(TransportError::Network("down".into())).is_recoverable());
    }

    #[test]
    fn document_errors_are_not_recoverable() {
        let err = ActionError::Document(DocumentError::MissingField("correct"));
        assert!(!err.is_recoverable());
        assert!(err.retains_record());
    }
}
