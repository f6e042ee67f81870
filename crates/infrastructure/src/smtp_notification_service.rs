//! SMTP notification service using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use gatehouse_application::NotificationService;
use gatehouse_core::{AppError, AppResult};

/// SMTP notification service configuration.
#[derive(Clone)]
pub struct SmtpNotificationConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production notification service using SMTP.
#[derive(Clone)]
pub struct SmtpNotificationService {
    config: SmtpNotificationConfig,
}

impl SmtpNotificationService {
    /// Creates a new SMTP notification service.
    #[must_use]
    pub fn new(config: SmtpNotificationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationService for SmtpNotificationService {
    async fn send(&self, to: &str, subject: &str, text_body: &str) -> AppResult<()> {
        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to_mailbox = to
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text_body.to_owned())
            .map_err(|error| AppError::Internal(format!("failed to build message: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send notification: {error}")))?;

        Ok(())
    }
}
