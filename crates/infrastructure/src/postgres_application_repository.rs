//! PostgreSQL-backed application repository.
//!
//! The two application kinds live in distinct tables with an identical
//! column layout; methods dispatch on the kind for the table name and the
//! user mirror columns. Every write method is one transaction covering the
//! application row, the owning user's mirror fields, and the audit entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatehouse_application::{
    ApplicationListFilter, ApplicationPage, ApplicationRecord, ApplicationRepository,
    DecisionOutcome, NewApplicationSubmission,
};
use gatehouse_core::{AppError, AppResult};
use gatehouse_domain::{ApplicationId, ApplicationKind, ApplicationStatus, ReviewDecision, UserId};

mod lookup;
mod maintenance;
mod review;
mod submission;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for membership applications.
#[derive(Clone)]
pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Table backing each application kind.
fn table(kind: ApplicationKind) -> &'static str {
    match kind {
        ApplicationKind::Initial => "initial_applications",
        ApplicationKind::FullMembership => "full_membership_applications",
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    user_id: Uuid,
    ticket: Option<String>,
    answers: serde_json::Value,
    status: String,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewer_id: Option<Uuid>,
    admin_notes: Option<String>,
}

impl ApplicationRow {
    fn into_record(self, kind: ApplicationKind) -> AppResult<ApplicationRecord> {
        Ok(ApplicationRecord {
            id: ApplicationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            kind,
            ticket: self.ticket,
            answers: self.answers,
            status: ApplicationStatus::parse(self.status.as_str())?,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            reviewer_id: self.reviewer_id.map(UserId::from_uuid),
            admin_notes: self.admin_notes,
        })
    }
}

/// Column list shared by all application row selects.
const APPLICATION_COLUMNS: &str =
    "id, user_id, ticket, answers, status, submitted_at, reviewed_at, reviewer_id, admin_notes";

fn begin_error(error: sqlx::Error) -> AppError {
    map_store_error("failed to begin transaction", error)
}

fn commit_error(error: sqlx::Error) -> AppError {
    map_store_error("failed to commit transaction", error)
}

/// Maps driver failures on the write paths. A pool timeout surfaces as the
/// timeout category; everything else inside an open transaction is a
/// rolled-back abort and safe to retry.
fn map_store_error(context: &str, error: sqlx::Error) -> AppError {
    if matches!(error, sqlx::Error::PoolTimedOut) {
        return AppError::Timeout(format!("{context}: {error}"));
    }

    AppError::TransactionFailed(format!("{context}: {error}"))
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    async fn submit(&self, submission: NewApplicationSubmission) -> AppResult<ApplicationRecord> {
        self.submit_impl(submission).await
    }

    async fn find_by_id(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
    ) -> AppResult<Option<ApplicationRecord>> {
        self.find_by_id_impl(kind, application_id).await
    }

    async fn find_latest_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Option<ApplicationRecord>> {
        self.find_latest_for_user_impl(kind, user_id).await
    }

    async fn list_for_user(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Vec<ApplicationRecord>> {
        self.list_for_user_impl(kind, user_id).await
    }

    async fn decide(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
        reviewer_id: UserId,
        decision: ReviewDecision,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        self.decide_impl(kind, application_id, reviewer_id, decision, admin_notes)
            .await
    }

    async fn amend_answers(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
        answers: serde_json::Value,
    ) -> AppResult<ApplicationRecord> {
        self.amend_answers_impl(kind, user_id, answers).await
    }

    async fn withdraw(&self, kind: ApplicationKind, user_id: UserId) -> AppResult<ApplicationId> {
        self.withdraw_impl(kind, user_id).await
    }

    async fn list(&self, filter: ApplicationListFilter) -> AppResult<ApplicationPage> {
        self.list_impl(filter).await
    }
}
