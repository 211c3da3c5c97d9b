//! Publish variant
//!
//! No busy fallback: publishing needs no optimistic local grant. Side
//! effects apply only on `Ok` — import the last internal version if one
//! exists, then increment the version number.

use super::{sync_authority_version, VersionSync};
use crate::action::{FollowUpRequest, PendingAction};
use crate::document::{AuthorityState, LogOutcome, ResultDocument};
use crate::error::{ActionError, DocumentError};
use cadastre_core::PublishLevel;
use serde::{Deserialize, Serialize};

/// Payload of a publish action: which segment to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub level: PublishLevel,
}

impl PublishPayload {
    #[must_use]
    pub fn new(level: PublishLevel) -> Self {
        Self { level }
    }

    pub fn encode(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|e| DocumentError::Payload(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(raw).map_err(|e| DocumentError::Payload(e.to_string()))
    }
}

/// `Ok` when the publish was applied, `Forbidden` when the authority
/// rejected it while the catalogue is still a major draft, `Pending`
/// otherwise.
pub(crate) fn extract(document: &ResultDocument) -> Result<LogOutcome, DocumentError> {
    let correct = document
        .correct
        .ok_or(DocumentError::MissingField("correct"))?;
    let state = document.state.ok_or(DocumentError::MissingField("state"))?;

    if correct {
        Ok(LogOutcome::Ok)
    } else if state == AuthorityState::MajorDraft {
        Ok(LogOutcome::Forbidden)
    } else {
        Ok(LogOutcome::Pending)
    }
}

/// Apply the publish outcome: only `Ok` has side effects.
pub(crate) async fn process(
    action: &mut PendingAction,
    outcome: LogOutcome,
    document: &ResultDocument,
) -> Result<Option<FollowUpRequest>, ActionError> {
    if outcome != LogOutcome::Ok {
        tracing::debug!(action = %action.record().id, %outcome, "publish not applied");
        return Ok(None);
    }
    let payload = PublishPayload::decode(&action.record().payload)?;
    let catalogue_id = action.record().catalogue_id;
    let catalogue = action.environment().registry.get(catalogue_id).await?;

    if sync_authority_version(action, &catalogue, document).await? == VersionSync::Diverged {
        return Ok(None);
    }

    let published = action
        .environment()
        .registry
        .publish(catalogue_id, payload.level)
        .await?;
    tracing::info!(
        catalogue = %published.code,
        version = %published.version,
        "publish version increment applied"
    );
    Ok(None)
}
