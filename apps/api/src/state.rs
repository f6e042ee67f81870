use std::sync::Arc;

use gatehouse_application::{
    AuditLogService, MembershipRepository, ReviewService, StatusService, SubmissionService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub submission_service: SubmissionService,
    pub review_service: ReviewService,
    pub status_service: StatusService,
    pub audit_log_service: AuditLogService,
    pub profiles: Arc<dyn MembershipRepository>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
