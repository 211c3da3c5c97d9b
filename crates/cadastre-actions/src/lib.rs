//! Cadastre Actions - pending-action coordination core
//!
//! Represents in-flight remote operations against the catalogue authority:
//! - A persisted record per operation, surviving restarts
//! - The polling/backoff/priority-downgrade retry protocol
//! - The optimistic forced-edit fallback used while the authority is busy
//! - Variant hooks for reserve, publish, upload and download operations
//! - A runner spawning one worker task per action
//!
//! # Example
//!
//! ```rust,ignore
//! use cadastre_actions::{ActionRunner, ReserveLevel};
//!
//! # async fn example(runner: ActionRunner, ctx: cadastre_core::OperationContext, id: cadastre_core::CatalogueId) -> Result<(), cadastre_actions::ActionError> {
//! let action = runner.submit_reserve(&ctx, id, ReserveLevel::Major).await?;
//! let result = runner.join(action).await.expect("worker tracked")?;
//! println!("outcome: {}", result.outcome);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod action;
pub mod document;
pub mod error;
pub mod importer;
pub mod listener;
pub mod poller;
pub mod priority;
pub mod record;
pub mod runner;
pub mod status;
pub mod store;
pub mod variants;

// Re-exports for convenience
pub use action::{ActionEnvironment, ActionResult, FollowUpRequest, PendingAction};
pub use document::{AuthorityState, LogOutcome, ResultDocument, Ticket};
pub use error::{ActionError, DocumentError, StoreError, TransportError};
pub use importer::{UpdateSource, VersionImporter};
pub use listener::{ActionListener, NullListener};
pub use poller::{ActionRequest, AuthorityClient, IntervalPoller, RemoteLogPoller};
pub use priority::{ActionConfig, PollSchedule, Priority};
pub use record::{ActionId, ActionKind, PendingActionRecord};
pub use runner::ActionRunner;
pub use status::{allowed_transitions, validate_transition, ActionStatus};
pub use store::PendingActionStore;
pub use variants::publish::PublishPayload;
pub use variants::reserve::ReservePayload;

// Re-exported from cadastre-core so callers of the runner do not need a
// second import for the common levels.
pub use cadastre_core::{PublishLevel, ReserveLevel};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
