//! PostgreSQL-backed user profile repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatehouse_application::{MembershipProfile, MembershipRepository};
use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{MembershipStage, UserApplicationStatus, UserId};

/// PostgreSQL-backed repository for membership profiles.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    email: Option<String>,
    display_name: String,
    membership_stage: String,
    is_member: bool,
    application_status: String,
    application_applied_at: Option<DateTime<Utc>>,
    application_reviewed_at: Option<DateTime<Utc>>,
    full_membership_status: String,
    full_membership_ticket: Option<String>,
    full_membership_applied_at: Option<DateTime<Utc>>,
    full_membership_reviewed_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
    fn into_profile(self) -> AppResult<MembershipProfile> {
        Ok(MembershipProfile {
            id: UserId::from_uuid(self.id),
            email: self.email,
            display_name: self.display_name,
            membership_stage: MembershipStage::parse(self.membership_stage.as_str())?,
            is_member: self.is_member,
            application_status: UserApplicationStatus::parse(self.application_status.as_str())?,
            application_applied_at: self.application_applied_at,
            application_reviewed_at: self.application_reviewed_at,
            full_membership_status: UserApplicationStatus::parse(
                self.full_membership_status.as_str(),
            )?,
            full_membership_ticket: self.full_membership_ticket,
            full_membership_applied_at: self.full_membership_applied_at,
            full_membership_reviewed_at: self.full_membership_reviewed_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, email, display_name, membership_stage, is_member, \
     application_status, application_applied_at, application_reviewed_at, \
     full_membership_status, full_membership_ticket, full_membership_applied_at, \
     full_membership_reviewed_at";

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MembershipProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");

        let row = sqlx::query_as::<_, ProfileRow>(sql.as_str())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load profile: {error}")))?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn ensure_profile(
        &self,
        user_id: UserId,
        display_name: &str,
        email: Option<&str>,
    ) -> AppResult<MembershipProfile> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(email)
        .bind(display_name)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure profile: {error}")))?;

        self.find_profile(user_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "profile '{user_id}' was not persisted after bootstrap"
            ))
        })
    }

    async fn list_user_ids_with_applications(&self, limit: usize) -> AppResult<Vec<UserId>> {
        let capped_limit = limit.clamp(1, 200) as i64;

        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM (
                SELECT user_id, MAX(submitted_at) AS last_activity
                FROM (
                    SELECT user_id, submitted_at FROM initial_applications
                    UNION ALL
                    SELECT user_id, submitted_at FROM full_membership_applications
                ) AS activity
                GROUP BY user_id
            ) AS ranked
            ORDER BY last_activity DESC
            LIMIT $1
            "#,
        )
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list users with applications: {error}"))
        })?;

        Ok(rows.into_iter().map(UserId::from_uuid).collect())
    }
}
