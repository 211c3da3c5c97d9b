//! Variant-specific side effects: reserve confirmation and invalidation,
//! publish increments, version import and divergence handling.

use cadastre_actions::{
    ActionRunner, ActionStatus, AuthorityState, LogOutcome, PublishLevel, ReserveLevel,
    ResultDocument,
};
use cadastre_core::{OperationContext, ReservableStatus};
use cadastre_test_utils::{seed_catalogue, test_env};

fn ctx() -> OperationContext {
    OperationContext::new("alice")
}

#[tokio::test]
async fn forbidden_outcome_invalidates_a_forced_session() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    // Silent past the high budget so the busy fallback forces the edit,
    // then a minor-vs-major-draft collision.
    fixture
        .authority
        .enqueue_delayed_response(10, ResultDocument::rejected(AuthorityState::MajorDraft));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_reserve(&ctx(), catalogue_id, ReserveLevel::Minor)
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Forbidden);
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    // Flagged, not deleted: the forced edits stay for manual reconciliation.
    assert_eq!(catalogue.reservable_status(), ReservableStatus::Invalid);
    assert_eq!(catalogue.version.to_string(), "2.3.1.NULL");
    // Terminated normally despite the rejection.
    assert!(!fixture.store.contains(action_id));
}

#[tokio::test]
async fn pending_outcome_without_forcing_leaves_catalogue_untouched() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture
        .authority
        .enqueue_response(ResultDocument::rejected(AuthorityState::Available));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_reserve(&ctx(), catalogue_id, ReserveLevel::Major)
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Pending);
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert!(catalogue.reservable_status().is_free());
    assert_eq!(catalogue.version.to_string(), "2.3");
}

#[tokio::test]
async fn unreserve_releases_the_reservation() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture
        .registry
        .reserve(catalogue_id, &ctx(), ReserveLevel::Minor)
        .await
        .unwrap();
    fixture
        .authority
        .enqueue_response(ResultDocument::applied(AuthorityState::Available));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_reserve(&ctx(), catalogue_id, ReserveLevel::None)
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Ok);
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert!(catalogue.reserved_by.is_none());
    assert!(catalogue.reservable_status().is_free());
}

#[tokio::test]
async fn publish_imports_newer_internal_version_before_increment() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture.authority.enqueue_response(
        ResultDocument::applied(AuthorityState::Published).with_latest_internal("2.3.5"),
    );

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_publish(&ctx(), catalogue_id, PublishLevel::Minor)
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Ok);
    // The import ran, as a visible status and an importer call.
    assert!(fixture
        .listener
        .statuses(action_id)
        .contains(&ActionStatus::ImportingLastVersion));
    let calls = fixture.importer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "2.3.5");
    // Increment applied on top of the imported version.
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert_eq!(catalogue.version.to_string(), "2.4.0");
}

#[tokio::test]
async fn publish_without_newer_version_skips_the_import() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture
        .authority
        .enqueue_response(ResultDocument::applied(AuthorityState::Published));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_publish(&ctx(), catalogue_id, PublishLevel::Major)
        .await
        .unwrap();
    runner.join(action_id).await.unwrap().unwrap();

    assert!(fixture.importer.calls().is_empty());
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert_eq!(catalogue.version.to_string(), "3.0.0");
}

#[tokio::test]
async fn rejected_publish_applies_no_increment() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture
        .authority
        .enqueue_response(ResultDocument::rejected(AuthorityState::MajorDraft));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_publish(&ctx(), catalogue_id, PublishLevel::Minor)
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Forbidden);
    assert!(fixture.importer.calls().is_empty());
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert_eq!(catalogue.version.to_string(), "2.3");
}

#[tokio::test]
async fn local_version_ahead_of_authority_is_flagged_invalid() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3.5");
    fixture.authority.enqueue_response(
        ResultDocument::applied(AuthorityState::MinorDraft).with_latest_internal("2.3.1"),
    );

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_reserve(&ctx(), catalogue_id, ReserveLevel::Minor)
        .await
        .unwrap();
    runner.join(action_id).await.unwrap().unwrap();

    assert!(fixture
        .listener
        .statuses(action_id)
        .contains(&ActionStatus::InvalidVersion));
    let catalogue = fixture.registry.get(catalogue_id).await.unwrap();
    assert_eq!(catalogue.reservable_status(), ReservableStatus::Invalid);
    // No reservation was applied on the diverged catalogue.
    assert!(catalogue.reserved_by.is_none());
}

#[tokio::test]
async fn upload_has_no_catalogue_side_effects() {
    let fixture = test_env();
    let catalogue_id = seed_catalogue(&fixture, "TAX", "2.3");
    fixture
        .authority
        .enqueue_response(ResultDocument::applied(AuthorityState::Available));

    let runner = ActionRunner::new(fixture.env.clone());
    let action_id = runner
        .submit_upload(&ctx(), catalogue_id, b"data".to_vec())
        .await
        .unwrap();
    let result = runner.join(action_id).await.unwrap().unwrap();

    assert_eq!(result.outcome, LogOutcome::Ok);
    let before = fixture.registry.get(catalogue_id).await.unwrap();
    assert_eq!(before.version.to_string(), "2.3");
    assert!(before.reservable_status().is_free());
}
