use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use gatehouse_core::{AppResult, UserIdentity};
use gatehouse_domain::{ApplicationId, ApplicationKind, ApplicationStatus};

use crate::dto::{
    ApiEnvelope, ApplicationListResponse, AuditLogEntryResponse, BulkReviewRequest,
    BulkReviewResponse, ConsistencyReportResponse, ReviewRequest, ReviewResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod audit;
mod consistency;
mod listing;
mod review;

pub use audit::list_audit_log_handler;
pub use consistency::status_consistency_handler;
pub use listing::list_applications_handler;
pub use review::{bulk_review_handler, review_application_handler};

/// Optional `kind` query parameter shared by the admin review surfaces.
/// The review queue predates the initial-application pipeline, so the
/// default stays `full_membership`.
#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<String>,
}

fn parse_kind(query: &KindQuery) -> AppResult<ApplicationKind> {
    query
        .kind
        .as_deref()
        .map(ApplicationKind::parse)
        .transpose()
        .map(|kind| kind.unwrap_or(ApplicationKind::FullMembership))
}
