//! PostgreSQL-backed access grant repository.
//!
//! Grant rows are created inside the approval transaction of the
//! application repository; this adapter only reads them and advances the
//! engagement counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatehouse_application::{AccessGrant, AccessGrantRepository};
use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::UserId;

/// PostgreSQL-backed repository for full-membership access grants.
#[derive(Clone)]
pub struct PostgresAccessGrantRepository {
    pool: PgPool,
}

impl PostgresAccessGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccessGrantRow {
    user_id: Uuid,
    first_accessed_at: Option<DateTime<Utc>>,
    access_count: i64,
    created_at: DateTime<Utc>,
}

impl From<AccessGrantRow> for AccessGrant {
    fn from(row: AccessGrantRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            first_accessed_at: row.first_accessed_at,
            access_count: row.access_count,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AccessGrantRepository for PostgresAccessGrantRepository {
    async fn find_for_user(&self, user_id: UserId) -> AppResult<Option<AccessGrant>> {
        let row = sqlx::query_as::<_, AccessGrantRow>(
            r#"
            SELECT user_id, first_accessed_at, access_count, created_at
            FROM access_grants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load access grant: {error}")))?;

        Ok(row.map(AccessGrant::from))
    }

    async fn record_access(&self, user_id: UserId) -> AppResult<Option<AccessGrant>> {
        let row = sqlx::query_as::<_, AccessGrantRow>(
            r#"
            UPDATE access_grants
            SET access_count = access_count + 1,
                first_accessed_at = COALESCE(first_accessed_at, now())
            WHERE user_id = $1
            RETURNING user_id, first_accessed_at, access_count, created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record access: {error}")))?;

        Ok(row.map(AccessGrant::from))
    }
}
