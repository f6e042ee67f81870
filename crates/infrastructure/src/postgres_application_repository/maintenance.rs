use gatehouse_application::NewAuditLogEntry;

use crate::audit::record_audit_entry;

use super::*;

impl PostgresApplicationRepository {
    pub(super) async fn amend_answers_impl(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
        answers: serde_json::Value,
    ) -> AppResult<ApplicationRecord> {
        // At most one pending row exists per user per kind, so the
        // conditional update targets it directly.
        let sql = format!(
            r#"
            UPDATE {table}
            SET answers = $2
            WHERE user_id = $1 AND status = 'pending'
            RETURNING {APPLICATION_COLUMNS}
            "#,
            table = table(kind),
        );

        let row = sqlx::query_as::<_, ApplicationRow>(sql.as_str())
            .bind(user_id.as_uuid())
            .bind(&answers)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to amend application answers: {error}"))
            })?;

        match row {
            Some(row) => row.into_record(kind),
            None => Err(self.no_pending_error(kind, user_id).await),
        }
    }

    pub(super) async fn withdraw_impl(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<ApplicationId> {
        let mut transaction = self.pool.begin().await.map_err(begin_error)?;

        let delete_sql = format!(
            r#"
            DELETE FROM {table}
            WHERE user_id = $1 AND status = 'pending'
            RETURNING id
            "#,
            table = table(kind),
        );

        let withdrawn = sqlx::query_scalar::<_, Uuid>(delete_sql.as_str())
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to withdraw application", error))?;

        let Some(withdrawn) = withdrawn else {
            return Err(AppError::NotFound(
                "no pending application to withdraw".to_owned(),
            ));
        };
        let application_id = ApplicationId::from_uuid(withdrawn);

        let mirror_sql = match kind {
            ApplicationKind::Initial => {
                r#"
                UPDATE users
                SET application_status = 'not_applied',
                    application_applied_at = NULL,
                    updated_at = now()
                WHERE id = $1
                "#
            }
            ApplicationKind::FullMembership => {
                r#"
                UPDATE users
                SET full_membership_status = 'not_applied',
                    full_membership_ticket = NULL,
                    full_membership_applied_at = NULL,
                    updated_at = now()
                WHERE id = $1
                "#
            }
        };

        sqlx::query(mirror_sql)
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error("failed to reset user status mirror", error))?;

        record_audit_entry(
            &mut transaction,
            &NewAuditLogEntry {
                actor: user_id.to_string(),
                action: format!("membership.{}.withdrawn", kind.as_str()),
                resource_type: "application".to_owned(),
                resource_id: application_id.to_string(),
                detail: None,
            },
        )
        .await?;

        transaction.commit().await.map_err(commit_error)?;

        Ok(application_id)
    }

    /// Distinguishes "never applied" from "already decided" for the amend
    /// path's error reporting.
    async fn no_pending_error(&self, kind: ApplicationKind, user_id: UserId) -> AppError {
        let sql = format!(
            r#"
            SELECT status
            FROM {table}
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
            table = table(kind),
        );

        let status = sqlx::query_scalar::<_, String>(sql.as_str())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await;

        match status {
            Ok(Some(status)) => AppError::AlreadyReviewed(format!(
                "the latest application was already {status}"
            )),
            Ok(None) => AppError::NotFound("no application found for user".to_owned()),
            Err(error) => {
                AppError::Internal(format!("failed to re-read application status: {error}"))
            }
        }
    }
}
