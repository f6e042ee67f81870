//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod audit;
mod console_notification_service;
mod postgres_access_grant_repository;
mod postgres_application_repository;
mod postgres_audit_log_repository;
mod postgres_membership_repository;
mod smtp_notification_service;

pub use console_notification_service::ConsoleNotificationService;
pub use postgres_access_grant_repository::PostgresAccessGrantRepository;
pub use postgres_application_repository::PostgresApplicationRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use smtp_notification_service::{SmtpNotificationConfig, SmtpNotificationService};
