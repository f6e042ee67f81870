use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use gatehouse_application::{
    ApplicationPage, AuditLogEntry, BulkReviewOutcome, ConsistencyReport, DecisionOutcome,
    StatusDiscrepancy,
};

use super::membership::ApplicationResponse;

/// Incoming payload for a single review decision.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/review-request.ts"
)]
pub struct ReviewRequest {
    pub decision: String,
    pub admin_notes: Option<String>,
}

/// Result of a single review decision.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/review-response.ts"
)]
pub struct ReviewResponse {
    pub application_id: String,
    pub user_id: String,
    pub decision: String,
}

impl From<DecisionOutcome> for ReviewResponse {
    fn from(outcome: DecisionOutcome) -> Self {
        Self {
            application_id: outcome.application_id.to_string(),
            user_id: outcome.user_id.to_string(),
            decision: outcome.decision.as_str().to_owned(),
        }
    }
}

/// Incoming payload for a bulk review decision.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-review-request.ts"
)]
pub struct BulkReviewRequest {
    pub application_ids: Vec<String>,
    pub decision: String,
    pub admin_notes: Option<String>,
}

/// One failed item of a bulk review.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-review-failure-response.ts"
)]
pub struct BulkReviewFailureResponse {
    pub application_id: String,
    pub error_type: String,
    pub message: String,
}

/// Aggregated result of a bulk review.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-review-response.ts"
)]
pub struct BulkReviewResponse {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkReviewFailureResponse>,
}

impl From<BulkReviewOutcome> for BulkReviewResponse {
    fn from(outcome: BulkReviewOutcome) -> Self {
        Self {
            succeeded: outcome
                .succeeded
                .into_iter()
                .map(|application_id| application_id.to_string())
                .collect(),
            failed: outcome
                .failed
                .into_iter()
                .map(|failure| BulkReviewFailureResponse {
                    application_id: failure.application_id.to_string(),
                    error_type: failure.error_type.to_owned(),
                    message: failure.message,
                })
                .collect(),
        }
    }
}

/// Pagination metadata for listings.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/pagination-response.ts"
)]
pub struct PaginationResponse {
    pub limit: usize,
    pub offset: usize,
    pub total: u64,
}

/// One page of the admin review queue.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/application-list-response.ts"
)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationResponse>,
    pub pagination: PaginationResponse,
}

impl ApplicationListResponse {
    /// Builds the listing response from a repository page and the
    /// requested window.
    #[must_use]
    pub fn from_page(page: ApplicationPage, limit: usize, offset: usize) -> Self {
        Self {
            applications: page
                .applications
                .into_iter()
                .map(ApplicationResponse::from)
                .collect(),
            pagination: PaginationResponse {
                limit,
                offset,
                total: page.total,
            },
        }
    }
}

/// One disagreeing field pair from the consistency checker.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/status-discrepancy-response.ts"
)]
pub struct StatusDiscrepancyResponse {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl From<StatusDiscrepancy> for StatusDiscrepancyResponse {
    fn from(discrepancy: StatusDiscrepancy) -> Self {
        Self {
            field: discrepancy.field,
            expected: discrepancy.expected,
            actual: discrepancy.actual,
        }
    }
}

/// Consistency diagnostic for one user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/consistency-report-response.ts"
)]
pub struct ConsistencyReportResponse {
    pub user_id: String,
    pub consistent: bool,
    pub discrepancies: Vec<StatusDiscrepancyResponse>,
}

impl From<ConsistencyReport> for ConsistencyReportResponse {
    fn from(report: ConsistencyReport) -> Self {
        Self {
            user_id: report.user_id.to_string(),
            consistent: report.consistent,
            discrepancies: report
                .discrepancies
                .into_iter()
                .map(StatusDiscrepancyResponse::from)
                .collect(),
        }
    }
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub entry_id: String,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<Value>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            entry_id: entry.entry_id,
            actor: entry.actor,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            detail: entry.detail,
            created_at: entry.created_at,
        }
    }
}
