//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod membership_ports;
mod review_service;
mod status_service;
mod submission_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use audit_log_service::AuditLogService;
pub use membership_ports::{
    AccessGrant, AccessGrantRepository, ApplicationListFilter, ApplicationPage,
    ApplicationRecord, ApplicationRepository, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    DecisionOutcome, MembershipProfile, MembershipRepository, NewApplicationSubmission,
    NewAuditLogEntry, NotificationService,
};
pub use review_service::{BulkReviewFailure, BulkReviewOutcome, ReviewService};
pub use status_service::{
    ConsistencyReport, MembershipStatusView, StatusDiscrepancy, StatusService, SurveyStatusView,
};
pub use submission_service::{SubmissionReceipt, SubmissionService};
