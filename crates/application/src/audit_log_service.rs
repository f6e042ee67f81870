//! Thin service over the append-only audit log port.

use std::sync::Arc;

use gatehouse_core::AppResult;

use crate::membership_ports::{AuditLogEntry, AuditLogQuery, AuditLogRepository, NewAuditLogEntry};

/// Application service for reading and appending audit log entries.
///
/// The transactional write paths append their entries inside their own
/// transactions; this service covers standalone appends and the admin
/// listing surface.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Appends one entry to the audit log.
    pub async fn record(&self, entry: NewAuditLogEntry) -> AppResult<()> {
        self.repository.append(entry).await
    }

    /// Lists recent audit log entries, newest first.
    pub async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_recent(query).await
    }
}
