//! Audit entry writes shared by the transactional repositories.

use sqlx::{Postgres, Transaction};

use gatehouse_application::NewAuditLogEntry;
use gatehouse_core::{AppError, AppResult};

/// Appends an audit entry inside an open transaction, so the entry commits
/// or rolls back together with the state change it describes.
pub(crate) async fn record_audit_entry(
    transaction: &mut Transaction<'_, Postgres>,
    entry: &NewAuditLogEntry,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log_entries (actor, action, resource_type, resource_id, detail)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry.actor.as_str())
    .bind(entry.action.as_str())
    .bind(entry.resource_type.as_str())
    .bind(entry.resource_id.as_str())
    .bind(entry.detail.as_ref())
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::TransactionFailed(format!("failed to append audit entry: {error}"))
    })?;

    Ok(())
}
