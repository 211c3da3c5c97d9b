//! Pending-action variants
//!
//! The retry protocol lives in one place ([`crate::action`]); each variant
//! supplies three hooks, dispatched on the closed [`ActionKind`]
//! discriminant:
//! - `extract_log_response` — classify a result document into an outcome
//! - `process_response` — apply catalogue/version side effects
//! - `manage_busy` — what the busy fallback means for this operation

pub mod publish;
pub mod reserve;
pub mod transfer;

use crate::action::{FollowUpRequest, PendingAction};
use crate::document::{LogOutcome, ResultDocument};
use crate::error::{ActionError, DocumentError};
use crate::record::{ActionKind, PendingActionRecord};
use crate::status::ActionStatus;
use cadastre_core::{Catalogue, Version};

/// Classify a result document for the record's variant.
pub(crate) fn extract_log_response(
    record: &PendingActionRecord,
    document: &ResultDocument,
) -> Result<LogOutcome, DocumentError> {
    match record.kind {
        ActionKind::Reserve => {
            let payload = reserve::ReservePayload::decode(&record.payload)?;
            Ok(reserve::extract(&payload, document)?)
        }
        ActionKind::Publish => publish::extract(document),
        ActionKind::UploadData | ActionKind::DownloadXmlUpdates => transfer::extract(document),
    }
}

/// The variant's busy fallback, invoked when the high-priority budget runs
/// out without a document. Only reservation-affecting variants do anything
/// here.
pub(crate) async fn manage_busy(action: &mut PendingAction) -> Result<(), ActionError> {
    match action.record().kind {
        ActionKind::Reserve => reserve::manage_busy(action).await,
        ActionKind::Publish | ActionKind::UploadData | ActionKind::DownloadXmlUpdates => Ok(()),
    }
}

/// Apply the variant's side effects for a classified outcome.
pub(crate) async fn process_response(
    action: &mut PendingAction,
    outcome: LogOutcome,
    document: &ResultDocument,
) -> Result<Option<FollowUpRequest>, ActionError> {
    match action.record().kind {
        ActionKind::Reserve => reserve::process(action, outcome, document).await,
        ActionKind::Publish => publish::process(action, outcome, document).await,
        ActionKind::UploadData => Ok(None),
        ActionKind::DownloadXmlUpdates => transfer::process_download(action, outcome).await,
    }
}

/// How the local version relates to the authority's newest internal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VersionSync {
    /// Nothing to do; local and authority agree.
    InSync,
    /// The authority was ahead; its version has been imported.
    Imported,
    /// The local version is ahead of the authority's view; the catalogue
    /// has been flagged invalid.
    Diverged,
}

/// Align the local version with the authority's newest internal version,
/// when the document carries one.
///
/// Comparison backs the forced increments out of the local tuple: a forced
/// session is numerically ahead of the state the authority knows about and
/// must not read as divergence.
pub(crate) async fn sync_authority_version(
    action: &mut PendingAction,
    catalogue: &Catalogue,
    document: &ResultDocument,
) -> Result<VersionSync, ActionError> {
    let Some(raw) = document.latest_internal.as_deref() else {
        return Ok(VersionSync::InSync);
    };
    let latest = Version::parse(raw);
    if !latest.is_applicable() {
        tracing::warn!(action = %action.record().id, raw, "unparseable authority version ignored");
        return Ok(VersionSync::InSync);
    }
    match catalogue.version.base_numeric_cmp(&latest) {
        std::cmp::Ordering::Less => {
            action.transition(ActionStatus::ImportingLastVersion).await?;
            action
                .environment()
                .importer
                .import_latest(catalogue.id, &latest)
                .await
                .map_err(ActionError::Transport)?;
            action
                .environment()
                .registry
                .set_version(catalogue.id, latest)
                .await?;
            tracing::info!(catalogue = %catalogue.code, "imported newer internal version");
            Ok(VersionSync::Imported)
        }
        std::cmp::Ordering::Greater => {
            action.transition(ActionStatus::InvalidVersion).await?;
            action
                .environment()
                .registry
                .invalidate(catalogue.id)
                .await?;
            tracing::warn!(catalogue = %catalogue.code, "local version ahead of authority, flagged invalid");
            Ok(VersionSync::Diverged)
        }
        std::cmp::Ordering::Equal => Ok(VersionSync::InSync),
    }
}
