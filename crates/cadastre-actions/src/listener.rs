//! Notification sink consumed by the UI layer
//!
//! Statuses are reported in the order they occur for a given action;
//! callbacks from different actions may interleave. The caller is
//! responsible for marshalling onto its own execution context.

use crate::document::{LogOutcome, Ticket};
use crate::record::PendingActionRecord;
use crate::status::ActionStatus;

/// Observer of pending-action progress.
pub trait ActionListener: Send + Sync {
    /// A remote request is about to be submitted.
    fn request_prepared(&self);

    /// The authority accepted the request and issued a ticket.
    fn request_sent(&self, action: &PendingActionRecord, ticket: &Ticket);

    /// The action moved to a new status.
    fn status_changed(&self, action: &PendingActionRecord, status: ActionStatus);

    /// The terminal classification is available.
    fn response_received(&self, action: &PendingActionRecord, outcome: LogOutcome);
}

/// Listener that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl ActionListener for NullListener {
    fn request_prepared(&self) {}
    fn request_sent(&self, _action: &PendingActionRecord, _ticket: &Ticket) {}
    fn status_changed(&self, _action: &PendingActionRecord, _status: ActionStatus) {}
    fn response_received(&self, _action: &PendingActionRecord, _outcome: LogOutcome) {}
}
