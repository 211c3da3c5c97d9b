//! Upload / download variants
//!
//! The minimal variants: outcome is `Ok`/`Pending` from the single
//! correctness flag, no busy fallback, no catalogue side effects. The
//! download variant additionally fetches the local updates file and hands
//! back a nested upload action.

use crate::action::{FollowUpRequest, PendingAction};
use crate::document::{LogOutcome, ResultDocument};
use crate::error::{ActionError, DocumentError};
use crate::record::ActionKind;

pub(crate) fn extract(document: &ResultDocument) -> Result<LogOutcome, DocumentError> {
    let correct = document
        .correct
        .ok_or(DocumentError::MissingField("correct"))?;
    Ok(if correct {
        LogOutcome::Ok
    } else {
        LogOutcome::Pending
    })
}

/// On a confirmed download, fetch the updates file and submit it back to
/// the authority as a nested upload action.
pub(crate) async fn process_download(
    action: &mut PendingAction,
    outcome: LogOutcome,
) -> Result<Option<FollowUpRequest>, ActionError> {
    if outcome != LogOutcome::Ok {
        return Ok(None);
    }
    let catalogue_id = action.record().catalogue_id;
    let body = action
        .environment()
        .updates
        .fetch_updates(catalogue_id)
        .await
        .map_err(ActionError::Transport)?;
    tracing::info!(
        action = %action.record().id,
        bytes = body.len(),
        "updates file fetched, submitting upload"
    );
    Ok(Some(FollowUpRequest {
        kind: ActionKind::UploadData,
        payload: String::new(),
        body: Some(body),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AuthorityState;

    #[test]
    fn correctness_flag_decides_outcome() {
        let ok = extract(&ResultDocument::applied(AuthorityState::Available)).unwrap();
        assert_eq!(ok, LogOutcome::Ok);

        let pending = extract(&ResultDocument::rejected(AuthorityState::Available)).unwrap();
        assert_eq!(pending, LogOutcome::Pending);
    }

    #[test]
    fn missing_flag_is_unreadable() {
        assert!(matches!(
            extract(&ResultDocument::default()),
            Err(DocumentError::MissingField("correct"))
        ));
    }
}
