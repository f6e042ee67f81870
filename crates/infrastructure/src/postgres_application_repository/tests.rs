use gatehouse_application::{
    ApplicationRepository, MembershipRepository, NewApplicationSubmission,
};
use gatehouse_core::AppError;
use gatehouse_domain::{
    ApplicationKind, ApplicationStatus, MembershipStage, ReviewDecision, Ticket, UserId,
};
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::PostgresMembershipRepository;

use super::PostgresApplicationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres application tests: {error}");
    }

    Some(pool)
}

async fn seed_pre_member(pool: &PgPool) -> UserId {
    let profiles = PostgresMembershipRepository::new(pool.clone());
    let user_id = UserId::new();
    let ensured = profiles
        .ensure_profile(user_id, "Integration User", None)
        .await;
    assert!(ensured.is_ok());

    let promoted = sqlx::query(
        r#"
        UPDATE users
        SET membership_stage = 'pre_member', application_status = 'approved'
        WHERE id = $1
        "#,
    )
    .bind(user_id.as_uuid())
    .execute(pool)
    .await;
    assert!(promoted.is_ok());

    user_id
}

fn ticket(value: &str) -> Ticket {
    let Ok(ticket) = Ticket::new(value) else {
        panic!("expected test ticket to validate");
    };
    ticket
}

#[tokio::test]
async fn decision_transaction_updates_application_user_and_grant_together() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresApplicationRepository::new(pool.clone());
    let profiles = PostgresMembershipRepository::new(pool.clone());
    let user_id = seed_pre_member(&pool).await;
    let reviewer_id = seed_pre_member(&pool).await;

    let submitted = repository
        .submit(NewApplicationSubmission {
            user_id,
            kind: ApplicationKind::FullMembership,
            ticket: Some(ticket("TCK-IT-1")),
            answers: json!({"motivation": "integration"}),
        })
        .await;
    let Ok(submitted) = submitted else {
        panic!("expected submission to succeed");
    };
    assert_eq!(submitted.status, ApplicationStatus::Pending);

    // The storage-level uniqueness constraint rejects a second pending row.
    let duplicate = repository
        .submit(NewApplicationSubmission {
            user_id,
            kind: ApplicationKind::FullMembership,
            ticket: Some(ticket("TCK-IT-2")),
            answers: json!({"motivation": "again"}),
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicatePending(_))));

    let decided = repository
        .decide(
            ApplicationKind::FullMembership,
            submitted.id,
            reviewer_id,
            ReviewDecision::Approved,
            Some("integration approval"),
        )
        .await;
    assert!(decided.is_ok());

    let profile = profiles.find_profile(user_id).await.ok().flatten();
    let Some(profile) = profile else {
        panic!("expected profile to exist");
    };
    assert_eq!(profile.membership_stage, MembershipStage::Member);
    assert!(profile.is_member);

    let grant_count = sqlx::query_scalar::<_, i64>(
        "SELECT access_count FROM access_grants WHERE user_id = $1",
    )
    .bind(user_id.as_uuid())
    .fetch_optional(&pool)
    .await;
    assert_eq!(grant_count.unwrap_or(None), Some(0));

    // The conditional update makes the second reviewer lose.
    let replay = repository
        .decide(
            ApplicationKind::FullMembership,
            submitted.id,
            reviewer_id,
            ReviewDecision::Declined,
            None,
        )
        .await;
    assert!(matches!(replay, Err(AppError::AlreadyReviewed(_))));
}
