use std::sync::Arc;

use serde_json::json;

use gatehouse_core::AppError;
use gatehouse_domain::{ApplicationKind, ApplicationStatus, MembershipStage, ReviewDecision};

use crate::membership_ports::{ApplicationRepository, MembershipRepository};
use crate::test_support::{FakeMembershipStore, FakeNotificationService};

use super::SubmissionService;

fn service_with(
    store: &FakeMembershipStore,
    notifications: Arc<FakeNotificationService>,
) -> SubmissionService {
    SubmissionService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        notifications,
    )
}

fn service(store: &FakeMembershipStore) -> SubmissionService {
    service_with(store, Arc::new(FakeNotificationService::new()))
}

#[tokio::test]
async fn pre_member_submits_full_membership_application() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);

    let receipt = service(&store)
        .submit_full_membership(&identity, json!({"motivation": "community"}), "TCK-001")
        .await;

    let Ok(receipt) = receipt else {
        panic!("expected submission to succeed");
    };
    assert_eq!(receipt.status, ApplicationStatus::Pending);

    let profile = store.find_profile(user_id).await.ok().flatten();
    let Some(profile) = profile else {
        panic!("expected profile to exist");
    };
    assert_eq!(
        profile.full_membership_ticket.as_deref(),
        Some("TCK-001")
    );
    assert!(profile.full_membership_applied_at.is_some());

    let actions = store.audit_actions().await;
    assert!(actions.contains(&"membership.full_membership.submitted".to_owned()));
}

#[tokio::test]
async fn second_submission_while_pending_is_rejected() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);
    let submissions = service(&store);

    let first = submissions
        .submit_full_membership(&identity, json!({"a": 1}), "TCK-001")
        .await;
    assert!(first.is_ok());

    let second = submissions
        .submit_full_membership(&identity, json!({"a": 2}), "TCK-002")
        .await;
    assert!(matches!(second, Err(AppError::DuplicatePending(_))));
}

#[tokio::test]
async fn applicant_cannot_apply_for_full_membership() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::Applicant).await;
    let identity = store.identity(user_id);

    let result = service(&store)
        .submit_full_membership(&identity, json!({"a": 1}), "TCK-001")
        .await;
    assert!(matches!(result, Err(AppError::IneligibleState(_))));
}

#[tokio::test]
async fn member_cannot_apply_again() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::Member).await;
    let identity = store.identity(user_id);

    let result = service(&store)
        .submit_full_membership(&identity, json!({"a": 1}), "TCK-001")
        .await;
    assert!(matches!(result, Err(AppError::IneligibleState(_))));
}

#[tokio::test]
async fn blank_ticket_is_rejected_before_any_write() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);

    let result = service(&store)
        .submit_full_membership(&identity, json!({"a": 1}), "   ")
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.audit_actions().await.is_empty());
}

#[tokio::test]
async fn non_object_answers_are_rejected() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);

    let result = service(&store)
        .submit_full_membership(&identity, json!(["free", "text"]), "TCK-001")
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn reapply_after_decline_creates_a_new_row() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let reviewer_id = store.insert_profile(MembershipStage::Member).await;
    let identity = store.identity(user_id);
    let submissions = service(&store);

    let first = submissions
        .submit_full_membership(&identity, json!({"round": 1}), "TCK-001")
        .await;
    let Ok(first) = first else {
        panic!("expected first submission to succeed");
    };

    let declined = store
        .decide(
            ApplicationKind::FullMembership,
            first.application_id,
            reviewer_id,
            ReviewDecision::Declined,
            Some("not yet"),
        )
        .await;
    assert!(declined.is_ok());

    let second = submissions
        .reapply_full_membership(&identity, json!({"round": 2}), "TCK-002")
        .await;
    assert!(second.is_ok());

    let history = store
        .list_for_user(ApplicationKind::FullMembership, user_id)
        .await
        .unwrap_or_default();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, ApplicationStatus::Pending);
    assert_eq!(history[1].status, ApplicationStatus::Declined);
    assert_eq!(history[1].admin_notes.as_deref(), Some("not yet"));
}

#[tokio::test]
async fn reapply_without_a_declined_application_is_rejected() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);

    let result = service(&store)
        .reapply_full_membership(&identity, json!({"round": 1}), "TCK-001")
        .await;
    assert!(matches!(result, Err(AppError::IneligibleState(_))));
}

#[tokio::test]
async fn initial_application_duplicate_and_approved_guards() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::Applicant).await;
    let reviewer_id = store.insert_profile(MembershipStage::Member).await;
    let identity = store.identity(user_id);
    let submissions = service(&store);

    let first = submissions
        .submit_initial(&identity, json!({"name": "Alice"}))
        .await;
    let Ok(first) = first else {
        panic!("expected initial submission to succeed");
    };

    let duplicate = submissions
        .submit_initial(&identity, json!({"name": "Alice"}))
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicatePending(_))));

    let approved = store
        .decide(
            ApplicationKind::Initial,
            first.application_id,
            reviewer_id,
            ReviewDecision::Approved,
            None,
        )
        .await;
    assert!(approved.is_ok());

    let after_approval = submissions
        .submit_initial(&identity, json!({"name": "Alice"}))
        .await;
    assert!(matches!(
        after_approval,
        Err(AppError::IneligibleState(_))
    ));
}

#[tokio::test]
async fn amending_answers_requires_a_pending_application() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::Applicant).await;
    let reviewer_id = store.insert_profile(MembershipStage::Member).await;
    let identity = store.identity(user_id);
    let submissions = service(&store);

    let missing = submissions
        .amend_initial_answers(&identity, json!({"name": "Alice"}))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let receipt = submissions
        .submit_initial(&identity, json!({"name": "Alice"}))
        .await;
    let Ok(receipt) = receipt else {
        panic!("expected initial submission to succeed");
    };

    let amended = submissions
        .amend_initial_answers(&identity, json!({"name": "Alice", "city": "Porto"}))
        .await;
    let Ok(amended) = amended else {
        panic!("expected amendment to succeed");
    };
    assert_eq!(amended.answers["city"], "Porto");

    let decided = store
        .decide(
            ApplicationKind::Initial,
            receipt.application_id,
            reviewer_id,
            ReviewDecision::Declined,
            None,
        )
        .await;
    assert!(decided.is_ok());

    let too_late = submissions
        .amend_initial_answers(&identity, json!({"name": "Alice"}))
        .await;
    assert!(matches!(too_late, Err(AppError::AlreadyReviewed(_))));
}

#[tokio::test]
async fn withdrawing_resets_the_mirror() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::Applicant).await;
    let identity = store.identity(user_id);
    let submissions = service(&store);

    let nothing = submissions.withdraw_initial(&identity).await;
    assert!(matches!(nothing, Err(AppError::NotFound(_))));

    let receipt = submissions
        .submit_initial(&identity, json!({"name": "Alice"}))
        .await;
    assert!(receipt.is_ok());

    let withdrawn = submissions.withdraw_initial(&identity).await;
    assert!(withdrawn.is_ok());

    let profile = store.find_profile(user_id).await.ok().flatten();
    let Some(profile) = profile else {
        panic!("expected profile to exist");
    };
    assert_eq!(
        profile.application_status,
        gatehouse_domain::UserApplicationStatus::NotApplied
    );
    assert!(profile.application_applied_at.is_none());

    let history = store
        .list_for_user(ApplicationKind::Initial, user_id)
        .await
        .unwrap_or_default();
    assert!(history.is_empty());
}

#[tokio::test]
async fn acknowledgement_is_sent_after_submission() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);
    let notifications = Arc::new(FakeNotificationService::new());

    let receipt = service_with(&store, notifications.clone())
        .submit_full_membership(&identity, json!({"a": 1}), "TCK-001")
        .await;
    assert!(receipt.is_ok());

    let sent = notifications.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].0.contains("@example.test"));
}

#[tokio::test]
async fn delivery_failure_does_not_fail_the_submission() {
    let store = FakeMembershipStore::new();
    let user_id = store.insert_profile(MembershipStage::PreMember).await;
    let identity = store.identity(user_id);
    let notifications = Arc::new(FakeNotificationService::failing());

    let receipt = service_with(&store, notifications)
        .submit_full_membership(&identity, json!({"a": 1}), "TCK-001")
        .await;
    assert!(receipt.is_ok());
}
