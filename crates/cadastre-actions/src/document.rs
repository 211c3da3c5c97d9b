//! Tickets, result documents and outcome classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque correlation token returned immediately by the authority and
/// redeemed later for a result document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(pub String);

impl Ticket {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The catalogue state the authority recorded in a result document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityState {
    /// No draft open; the catalogue is free.
    Available,
    /// A minor draft is open.
    MinorDraft,
    /// A major draft is open.
    MajorDraft,
    /// The catalogue is published at its current version.
    Published,
}

/// The document redeemed for a ticket once the authority has processed
/// the request. Fields are optional because the wire format is outside
/// this crate; a variant that cannot find what it needs classifies the
/// document as unreadable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    /// Whether the authority applied the operation as requested.
    pub correct: Option<bool>,
    /// The catalogue state the authority recorded.
    pub state: Option<AuthorityState>,
    /// Newest internal version on the authority, when one exists.
    pub latest_internal: Option<String>,
}

impl ResultDocument {
    /// A document reporting the operation applied, with the given state.
    #[must_use]
    pub fn applied(state: AuthorityState) -> Self {
        Self {
            correct: Some(true),
            state: Some(state),
            latest_internal: None,
        }
    }

    /// A document reporting the operation not (or not yet) applied.
    #[must_use]
    pub fn rejected(state: AuthorityState) -> Self {
        Self {
            correct: Some(false),
            state: Some(state),
            latest_internal: None,
        }
    }

    /// Attach the authority's newest internal version.
    #[must_use]
    pub fn with_latest_internal(mut self, version: impl Into<String>) -> Self {
        self.latest_internal = Some(version.into());
        self
    }
}

/// Terminal classification of a result document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutcome {
    /// The authority applied the operation as intended.
    Ok,
    /// The authority rejected the operation outright.
    Forbidden,
    /// Pending or ambiguous: the authority has not settled the operation.
    Pending,
}

impl fmt::Display for LogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogOutcome::Ok => write!(f, "OK"),
            LogOutcome::Forbidden => write!(f, "FORBIDDEN"),
            LogOutcome::Pending => write!(f, "AP"),
        }
    }
}
