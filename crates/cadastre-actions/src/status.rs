//! Pending-action status state machine

use crate::error::ActionError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a pending action.
///
/// The main path is `Started → Sending → (Queued ↔ ForcingEditing) →
/// Completed`; the remaining statuses are side branches entered when the
/// result document or the local version state is not what the protocol
/// expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Action created, worker not yet polling.
    Started,
    /// Polling under the high-priority schedule.
    Sending,
    /// Granting an optimistic forced-edit session while the authority is busy.
    ForcingEditing,
    /// Downgraded to the low-priority schedule; polling indefinitely.
    Queued,
    /// Fetching a newer internal version from the authority.
    ImportingLastVersion,
    /// Local version diverged from the authority's view.
    InvalidVersion,
    /// Result document could not be interpreted.
    InvalidResponse,
    /// Terminal: outcome delivered, record deleted.
    Completed,
    /// Terminal: protocol aborted, record retained for re-issue.
    Error,
}

impl ActionStatus {
    /// Whether this status ends the protocol.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Error)
    }
}

/// Validates a status transition.
pub fn validate_transition(from: ActionStatus, to: ActionStatus) -> Result<(), ActionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ActionError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: ActionStatus) -> Vec<ActionStatus> {
    use ActionStatus::*;
    match from {
        Started => vec![Sending],
        Sending => vec![
            ForcingEditing,
            Queued,
            ImportingLastVersion,
            InvalidVersion,
            InvalidResponse,
            Completed,
            Error,
        ],
        ForcingEditing => vec![Queued, Error],
        Queued => vec![
            ForcingEditing,
            ImportingLastVersion,
            InvalidVersion,
            InvalidResponse,
            Completed,
            Error,
        ],
        ImportingLastVersion => vec![InvalidVersion, Completed, Error],
        InvalidVersion => vec![Completed, Error],
        InvalidResponse => vec![Completed, Error],
        Completed => vec![],
        Error => vec![],
    }
}

fn allowed(from: ActionStatus, to: ActionStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
