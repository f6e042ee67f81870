use gatehouse_application::{AuditLogQuery, AuditLogRepository, NewAuditLogEntry};
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresAuditLogRepository;

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
        panic!("failed to run migrations for postgres audit log tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn appended_entries_are_listed_newest_first_with_filters() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuditLogRepository::new(pool);
    let actor = format!("test-actor-{}", uuid::Uuid::new_v4());

    let first = repository
        .append(NewAuditLogEntry {
            actor: actor.clone(),
            action: "membership.full_membership.submitted".to_owned(),
            resource_type: "application".to_owned(),
            resource_id: "app-1".to_owned(),
            detail: Some(json!({"ticket": "TCK-001"})),
        })
        .await;
    assert!(first.is_ok());

    let second = repository
        .append(NewAuditLogEntry {
            actor: actor.clone(),
            action: "membership.full_membership.approved".to_owned(),
            resource_type: "application".to_owned(),
            resource_id: "app-1".to_owned(),
            detail: None,
        })
        .await;
    assert!(second.is_ok());

    let all_for_actor = repository
        .list_recent(AuditLogQuery {
            limit: 50,
            offset: 0,
            action: None,
            actor: Some(actor.clone()),
        })
        .await;
    assert!(all_for_actor.is_ok());
    let all_for_actor = all_for_actor.unwrap_or_default();
    assert_eq!(all_for_actor.len(), 2);
    assert_eq!(
        all_for_actor[0].action,
        "membership.full_membership.approved"
    );

    let filtered = repository
        .list_recent(AuditLogQuery {
            limit: 50,
            offset: 0,
            action: Some("membership.full_membership.submitted".to_owned()),
            actor: Some(actor),
        })
        .await;
    assert!(filtered.is_ok());
    let filtered = filtered.unwrap_or_default();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].resource_id, "app-1");
}
