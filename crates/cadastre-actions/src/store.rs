//! Durable store contract for pending actions
//!
//! The table is keyed by action id and survives process restarts so
//! in-flight actions can resume. Deletion happens exactly once, at
//! terminal success; an action that aborts with `Error` keeps its row.

use crate::error::StoreError;
use crate::record::{ActionId, PendingActionRecord};

/// Durable table of in-flight remote operations.
#[async_trait::async_trait]
pub trait PendingActionStore: Send + Sync {
    /// Persist a freshly created record.
    async fn insert(&self, record: &PendingActionRecord) -> Result<(), StoreError>;

    /// Persist in-place mutation of an existing record (status, priority,
    /// outcome).
    async fn update(&self, record: &PendingActionRecord) -> Result<(), StoreError>;

    /// Remove a record. Callers rely on this being the sole deletion path;
    /// deleting an absent id is a `NotFound` error, not a no-op.
    async fn delete(&self, id: ActionId) -> Result<(), StoreError>;

    /// Load every surviving record, e.g. at startup after a crash.
    async fn load_all(&self) -> Result<Vec<PendingActionRecord>, StoreError>;
}
