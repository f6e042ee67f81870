use gatehouse_application::NewAuditLogEntry;
use serde_json::json;

use crate::audit::record_audit_entry;

use super::*;

impl PostgresApplicationRepository {
    pub(super) async fn submit_impl(
        &self,
        submission: NewApplicationSubmission,
    ) -> AppResult<ApplicationRecord> {
        let mut transaction = self.pool.begin().await.map_err(begin_error)?;

        let insert_sql = format!(
            r#"
            INSERT INTO {table} (user_id, ticket, answers)
            VALUES ($1, $2, $3)
            RETURNING {APPLICATION_COLUMNS}
            "#,
            table = table(submission.kind),
        );

        let row = sqlx::query_as::<_, ApplicationRow>(insert_sql.as_str())
            .bind(submission.user_id.as_uuid())
            .bind(submission.ticket.as_ref().map(|ticket| ticket.as_str()))
            .bind(&submission.answers)
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                // The partial unique index closes the submit race the
                // service pre-check cannot.
                if error
                    .as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation())
                {
                    return AppError::DuplicatePending(
                        "a pending application of this kind already exists".to_owned(),
                    );
                }
                map_store_error("failed to insert application", error)
            })?;

        let mirror_sql = match submission.kind {
            ApplicationKind::Initial => {
                r#"
                UPDATE users
                SET application_status = 'pending',
                    application_applied_at = $2,
                    application_reviewed_at = NULL,
                    updated_at = now()
                WHERE id = $1
                "#
            }
            ApplicationKind::FullMembership => {
                r#"
                UPDATE users
                SET full_membership_status = 'pending',
                    full_membership_ticket = $3,
                    full_membership_applied_at = $2,
                    full_membership_reviewed_at = NULL,
                    updated_at = now()
                WHERE id = $1
                "#
            }
        };

        let mut mirror_update = sqlx::query(mirror_sql)
            .bind(submission.user_id.as_uuid())
            .bind(row.submitted_at);
        if submission.kind == ApplicationKind::FullMembership {
            mirror_update = mirror_update.bind(row.ticket.as_deref());
        }

        let mirror_result = mirror_update
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to update user status mirror", error))?;

        if mirror_result.rows_affected() == 0 {
            return Err(AppError::TransactionFailed(format!(
                "user '{}' disappeared while submitting",
                submission.user_id
            )));
        }

        record_audit_entry(
            &mut transaction,
            &NewAuditLogEntry {
                actor: submission.user_id.to_string(),
                action: format!("membership.{}.submitted", submission.kind.as_str()),
                resource_type: "application".to_owned(),
                resource_id: row.id.to_string(),
                detail: Some(json!({
                    "ticket": row.ticket,
                })),
            },
        )
        .await?;

        transaction.commit().await.map_err(commit_error)?;

        row.into_record(submission.kind)
    }
}
