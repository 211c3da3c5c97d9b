//! The persisted pending-action record
//!
//! One row per in-flight remote operation. The record survives process
//! restarts so polling can resume after a crash; it is deleted exactly
//! once, when the action terminates.

use crate::document::{LogOutcome, Ticket};
use crate::priority::Priority;
use crate::status::ActionStatus;
use cadastre_core::CatalogueId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique pending-action identifier (ULID for sortability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Ulid);

impl ActionId {
    /// Generate a new action id.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminant for the four pending-action variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Reserve,
    Publish,
    UploadData,
    DownloadXmlUpdates,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Reserve => write!(f, "RESERVE"),
            ActionKind::Publish => write!(f, "PUBLISH"),
            ActionKind::UploadData => write!(f, "UPLOAD_DATA"),
            ActionKind::DownloadXmlUpdates => write!(f, "DOWNLOAD_XML_UPDATES"),
        }
    }
}

/// One in-flight remote operation, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingActionRecord {
    pub id: ActionId,
    pub catalogue_id: CatalogueId,
    /// Opaque remote correlation token.
    pub ticket: Ticket,
    /// Initiating user.
    pub username: String,
    pub priority: Priority,
    pub status: ActionStatus,
    pub kind: ActionKind,
    /// Kind-specific data, opaque at this level (serialized reserve level,
    /// publish level, or empty).
    pub payload: String,
    /// Terminal classification, set just before completion.
    pub outcome: Option<LogOutcome>,
    pub created_at: DateTime<Utc>,
}

impl PendingActionRecord {
    /// Create a fresh record: high priority, `Started`, no outcome.
    #[must_use]
    pub fn new(
        kind: ActionKind,
        catalogue_id: CatalogueId,
        ticket: Ticket,
        username: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            catalogue_id,
            ticket,
            username: username.into(),
            priority: Priority::High,
            status: ActionStatus::Started,
            kind,
            payload: payload.into(),
            outcome: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_defaults() {
        let record = PendingActionRecord::new(
            ActionKind::Reserve,
            CatalogueId::new(),
            Ticket::new("T-1"),
            "alice",
            "{}",
        );
        assert_eq!(record.priority, Priority::High);
        assert_eq!(record.status, ActionStatus::Started);
        assert!(record.outcome.is_none());
    }

    #[test]
    fn kind_discriminants_render_like_the_store_column() {
        assert_eq!(ActionKind::Reserve.to_string(), "RESERVE");
        assert_eq!(
            ActionKind::DownloadXmlUpdates.to_string(),
            "DOWNLOAD_XML_UPDATES"
        );
    }
}
