mod admin;
mod common;
mod membership;

pub use admin::{
    ApplicationListResponse, AuditLogEntryResponse, BulkReviewFailureResponse,
    BulkReviewRequest, BulkReviewResponse, ConsistencyReportResponse, PaginationResponse,
    ReviewRequest, ReviewResponse, StatusDiscrepancyResponse,
};
pub use common::{ApiEnvelope, HealthResponse, UserIdentityResponse};
pub use membership::{
    AccessGrantResponse, AmendAnswersRequest, ApplicationResponse, MembershipStatusResponse,
    SubmissionResponse, SubmitApplicationRequest, SubmitFullMembershipRequest,
    SurveyStatusResponse, WithdrawResponse,
};
