use super::*;

impl PostgresApplicationRepository {
    pub(super) async fn find_by_id_impl(
        &self,
        kind: ApplicationKind,
        application_id: ApplicationId,
    ) -> AppResult<Option<ApplicationRecord>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM {table} WHERE id = $1",
            table = table(kind),
        );

        let row = sqlx::query_as::<_, ApplicationRow>(sql.as_str())
            .bind(application_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load application: {error}")))?;

        row.map(|row| row.into_record(kind)).transpose()
    }

    pub(super) async fn find_latest_for_user_impl(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Option<ApplicationRecord>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM {table}
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
            table = table(kind),
        );

        let row = sqlx::query_as::<_, ApplicationRow>(sql.as_str())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load latest application: {error}"))
            })?;

        row.map(|row| row.into_record(kind)).transpose()
    }

    pub(super) async fn list_for_user_impl(
        &self,
        kind: ApplicationKind,
        user_id: UserId,
    ) -> AppResult<Vec<ApplicationRecord>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM {table}
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            "#,
            table = table(kind),
        );

        let rows = sqlx::query_as::<_, ApplicationRow>(sql.as_str())
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list applications for user: {error}"))
            })?;

        rows.into_iter()
            .map(|row| row.into_record(kind))
            .collect()
    }

    pub(super) async fn list_impl(
        &self,
        filter: ApplicationListFilter,
    ) -> AppResult<ApplicationPage> {
        let capped_limit = filter.limit.clamp(1, 200) as i64;
        let capped_offset = filter.offset.min(10_000) as i64;
        let status = filter.status.map(|status| status.as_str());

        let count_sql = format!(
            r#"
            SELECT COUNT(*)
            FROM {table}
            WHERE ($1::TEXT IS NULL OR status = $1)
            "#,
            table = table(filter.kind),
        );

        let total = sqlx::query_scalar::<_, i64>(count_sql.as_str())
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count applications: {error}"))
            })?;

        let page_sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM {table}
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY submitted_at DESC
            LIMIT $2
            OFFSET $3
            "#,
            table = table(filter.kind),
        );

        let rows = sqlx::query_as::<_, ApplicationRow>(page_sql.as_str())
            .bind(status)
            .bind(capped_limit)
            .bind(capped_offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list applications: {error}")))?;

        let applications = rows
            .into_iter()
            .map(|row| row.into_record(filter.kind))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ApplicationPage {
            applications,
            total: total.max(0) as u64,
        })
    }
}
