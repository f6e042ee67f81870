use gatehouse_application::NewAuditLogEntry;
use serde_json::json;

use crate::audit::record_audit_entry;

use super::*;

impl PostgresApplicationRepository {
    pub(super) async fn decide_impl(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
        reviewer_id: UserId,
        decision: ReviewDecision,
        admin_notes: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        let mut transaction = self.pool.begin().await.map_err(begin_error)?;

        // Conditional transition: only a pending row matches, so of two
        // concurrent reviewers exactly one sees an affected row.
        let update_sql = format!(
            r#"
            UPDATE {table}
            SET status = $2,
                reviewed_at = now(),
                reviewer_id = $3,
                admin_notes = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING user_id
            "#,
            table = table(kind),
        );

        let decided_user = sqlx::query_scalar::<_, Uuid>(update_sql.as_str())
            .bind(application_id.as_uuid())
            .bind(decision.as_str())
            .bind(reviewer_id.as_uuid())
            .bind(admin_notes)
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to apply decision", error))?;

        let Some(decided_user) = decided_user else {
            return Err(self.losing_reviewer_error(kind, application_id).await);
        };
        let user_id = UserId::from_uuid(decided_user);

        let mirror_sql = match (kind, decision) {
            (ApplicationKind::FullMembership, ReviewDecision::Approved) => {
                r#"
                UPDATE users
                SET membership_stage = 'member',
                    is_member = TRUE,
                    full_membership_status = 'approved',
                    full_membership_reviewed_at = now(),
                    updated_at = now()
                WHERE id = $1
                "#
            }
            (ApplicationKind::FullMembership, ReviewDecision::Declined) => {
                r#"
                UPDATE users
                SET full_membership_status = 'declined',
                    full_membership_reviewed_at = now(),
                    updated_at = now()
                WHERE id = $1
                "#
            }
            (ApplicationKind::Initial, ReviewDecision::Approved) => {
                r#"
                UPDATE users
                SET application_status = 'approved',
                    application_reviewed_at = now(),
                    membership_stage = CASE
                        WHEN membership_stage = 'applicant' THEN 'pre_member'
                        ELSE membership_stage
                    END,
                    updated_at = now()
                WHERE id = $1
                "#
            }
            (ApplicationKind::Initial, ReviewDecision::Declined) => {
                r#"
                UPDATE users
                SET application_status = 'declined',
                    application_reviewed_at = now(),
                    updated_at = now()
                WHERE id = $1
                "#
            }
        };

        sqlx::query(mirror_sql)
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to update user status mirror", error))?;

        if kind == ApplicationKind::FullMembership && decision == ReviewDecision::Approved {
            // Idempotent grant upsert: create with zero counters on the
            // first approval, never touch an existing grant.
            sqlx::query(
                r#"
                INSERT INTO access_grants (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                "#,
            )
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to upsert access grant", error))?;
        }

        record_audit_entry(
            &mut transaction,
            &NewAuditLogEntry {
                actor: reviewer_id.to_string(),
                action: format!("membership.{}.{}", kind.as_str(), decision.as_str()),
                resource_type: "application".to_owned(),
                resource_id: application_id.to_string(),
                detail: Some(json!({
                    "applicant": user_id.to_string(),
                    "decision": decision.as_str(),
                    "adminNotes": admin_notes,
                })),
            },
        )
        .await?;

        transaction.commit().await.map_err(commit_error)?;

        Ok(DecisionOutcome {
            application_id,
            user_id,
            decision,
        })
    }

    /// Distinguishes a vanished application from one another reviewer got
    /// to first. Runs outside the aborted transaction.
    async fn losing_reviewer_error(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
    ) -> AppError {
        let status_sql = format!(
            "SELECT status FROM {table} WHERE id = $1",
            table = table(kind),
        );

        let status = sqlx::query_scalar::<_, String>(status_sql.as_str())
            .bind(application_id.as_uuid())
            .fetch_optional(&self.pool)
            .await;

        match status {
            Ok(Some(status)) => AppError::AlreadyReviewed(format!(
                "application '{application_id}' was already {status}"
            )),
            Ok(None) => AppError::NotFound(format!("application '{application_id}' not found")),
            Err(error) => {
                AppError::Internal(format!("failed to re-read application status: {error}"))
            }
        }
    }
}
