//! Reserve / unreserve variant
//!
//! The only variant with a busy fallback: when the authority's answer is
//! late, the user gets an optimistic forced-edit grant instead of waiting,
//! and the eventual outcome either confirms or invalidates that session.

use super::{sync_authority_version, VersionSync};
use crate::action::{FollowUpRequest, PendingAction};
use crate::document::{AuthorityState, LogOutcome, ResultDocument};
use crate::error::{ActionError, DocumentError};
use crate::status::ActionStatus;
use cadastre_core::{OperationContext, ReserveLevel};
use serde::{Deserialize, Serialize};

/// Payload of a reserve action: the requested level. `None` releases an
/// existing reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePayload {
    pub level: ReserveLevel,
}

impl ReservePayload {
    #[must_use]
    pub fn new(level: ReserveLevel) -> Self {
        Self { level }
    }

    pub fn encode(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|e| DocumentError::Payload(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(raw).map_err(|e| DocumentError::Payload(e.to_string()))
    }
}

/// `Ok` when the authority applied what was asked, `Forbidden` when a minor
/// reservation collided with a major draft, `Pending` otherwise.
pub(crate) fn extract(
    payload: &ReservePayload,
    document: &ResultDocument,
) -> Result<LogOutcome, DocumentError> {
    let correct = document
        .correct
        .ok_or(DocumentError::MissingField("correct"))?;
    let state = document.state.ok_or(DocumentError::MissingField("state"))?;

    if correct && state_matches(payload.level, state) {
        Ok(LogOutcome::Ok)
    } else if payload.level == ReserveLevel::Minor && state == AuthorityState::MajorDraft {
        Ok(LogOutcome::Forbidden)
    } else {
        Ok(LogOutcome::Pending)
    }
}

fn state_matches(level: ReserveLevel, state: AuthorityState) -> bool {
    match level {
        ReserveLevel::None => {
            matches!(state, AuthorityState::Available | AuthorityState::Published)
        }
        ReserveLevel::Minor => state == AuthorityState::MinorDraft,
        ReserveLevel::Major => state == AuthorityState::MajorDraft,
    }
}

/// Busy fallback: grant an optimistic forced-edit session so the user is
/// not blocked while the authority is still processing. Skipped when the
/// request releases a reservation, or the catalogue is already forced or
/// local.
pub(crate) async fn manage_busy(action: &mut PendingAction) -> Result<(), ActionError> {
    let payload = ReservePayload::decode(&action.record().payload)?;
    if !payload.level.grants_editing() {
        return Ok(());
    }
    let catalogue_id = action.record().catalogue_id;
    let catalogue = action.environment().registry.get(catalogue_id).await?;
    if catalogue.local || catalogue.version.is_forced() {
        return Ok(());
    }
    action.transition(ActionStatus::ForcingEditing).await?;
    let ctx = OperationContext::new(action.record().username.clone());
    action
        .environment()
        .registry
        .force_edit(catalogue_id, &ctx, payload.level)
        .await?;
    tracing::info!(
        catalogue = %catalogue.code,
        user = %ctx.username,
        level = %payload.level,
        "optimistic forced edit granted"
    );
    Ok(())
}

/// Apply the reserve outcome.
///
/// A non-`Ok` outcome on a forced session invalidates the version: the
/// local edits are flagged for manual reconciliation, never deleted. An
/// `Ok` outcome confirms any forced session and performs the real
/// reserve/unreserve.
pub(crate) async fn process(
    action: &mut PendingAction,
    outcome: LogOutcome,
    document: &ResultDocument,
) -> Result<Option<FollowUpRequest>, ActionError> {
    let payload = ReservePayload::decode(&action.record().payload)?;
    let catalogue_id = action.record().catalogue_id;
    let catalogue = action.environment().registry.get(catalogue_id).await?;
    let was_forced = catalogue.version.is_forced();

    if outcome != LogOutcome::Ok {
        if was_forced {
            action.environment().registry.invalidate(catalogue_id).await?;
            tracing::warn!(
                catalogue = %catalogue.code,
                %outcome,
                "forced session rejected by authority, version invalidated"
            );
        }
        return Ok(None);
    }

    if sync_authority_version(action, &catalogue, document).await? == VersionSync::Diverged {
        return Ok(None);
    }

    if was_forced {
        action.environment().registry.confirm(catalogue_id).await?;
    }
    let ctx = OperationContext::new(action.record().username.clone());
    match payload.level {
        ReserveLevel::None => {
            action.environment().registry.unreserve(catalogue_id).await?;
        }
        level => {
            action
                .environment()
                .registry
                .reserve(catalogue_id, &ctx, level)
                .await?;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(correct: bool, state: AuthorityState) -> ResultDocument {
        if correct {
            ResultDocument::applied(state)
        } else {
            ResultDocument::rejected(state)
        }
    }

    #[test]
    fn payload_round_trips() {
        let payload = ReservePayload::new(ReserveLevel::Major);
        let decoded = ReservePayload::decode(&payload.encode().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn matching_intent_is_ok() {
        let payload = ReservePayload::new(ReserveLevel::Minor);
        let outcome = extract(&payload, &doc(true, AuthorityState::MinorDraft)).unwrap();
        assert_eq!(outcome, LogOutcome::Ok);

        let release = ReservePayload::new(ReserveLevel::None);
        let outcome = extract(&release, &doc(true, AuthorityState::Available)).unwrap();
        assert_eq!(outcome, LogOutcome::Ok);
    }

    #[test]
    fn minor_against_major_draft_is_forbidden() {
        let payload = ReservePayload::new(ReserveLevel::Minor);
        let outcome = extract(&payload, &doc(false, AuthorityState::MajorDraft)).unwrap();
        assert_eq!(outcome, LogOutcome::Forbidden);
    }

    #[test]
    fn anything_else_is_pending() {
        let payload = ReservePayload::new(ReserveLevel::Major);
        let outcome = extract(&payload, &doc(false, AuthorityState::Available)).unwrap();
        assert_eq!(outcome, LogOutcome::Pending);
    }

    #[test]
    fn missing_fields_are_unreadable() {
        let payload = ReservePayload::new(ReserveLevel::Minor);
        let document = ResultDocument::default();
        assert!(matches!(
            extract(&payload, &document),
            Err(DocumentError::MissingField("correct"))
        ));
    }
}
