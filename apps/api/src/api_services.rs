use std::sync::Arc;

use sqlx::PgPool;

use gatehouse_application::{
    AuditLogService, NotificationService, ReviewService, StatusService, SubmissionService,
};
use gatehouse_infrastructure::{
    ConsoleNotificationService, PostgresAccessGrantRepository, PostgresApplicationRepository,
    PostgresAuditLogRepository, PostgresMembershipRepository, SmtpNotificationConfig,
    SmtpNotificationService,
};

use crate::api_config::{ApiConfig, NotificationProviderConfig};
use crate::state::AppState;

/// Wires repositories and services into the shared application state.
pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let applications = Arc::new(PostgresApplicationRepository::new(pool.clone()));
    let profiles = Arc::new(PostgresMembershipRepository::new(pool.clone()));
    let grants = Arc::new(PostgresAccessGrantRepository::new(pool.clone()));
    let audit_log = Arc::new(PostgresAuditLogRepository::new(pool));

    let notifications: Arc<dyn NotificationService> = match &config.notification_provider {
        NotificationProviderConfig::Console => Arc::new(ConsoleNotificationService::new()),
        NotificationProviderConfig::Smtp(smtp) => {
            Arc::new(SmtpNotificationService::new(SmtpNotificationConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
                from_address: smtp.from_address.clone(),
            }))
        }
    };

    AppState {
        submission_service: SubmissionService::new(
            applications.clone(),
            profiles.clone(),
            notifications.clone(),
        ),
        review_service: ReviewService::new(
            applications.clone(),
            profiles.clone(),
            audit_log.clone(),
            notifications,
        ),
        status_service: StatusService::new(applications, profiles.clone(), grants),
        audit_log_service: AuditLogService::new(audit_log),
        profiles,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
