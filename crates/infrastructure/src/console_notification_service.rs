//! Console notification service for development. Logs notifications to
//! tracing output.

use async_trait::async_trait;
use gatehouse_application::NotificationService;
use gatehouse_core::AppResult;
use tracing::info;

/// Development notification service that logs messages to the console.
#[derive(Clone)]
pub struct ConsoleNotificationService;

impl ConsoleNotificationService {
    /// Creates a new console notification service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationService for ConsoleNotificationService {
    async fn send(&self, to: &str, subject: &str, text_body: &str) -> AppResult<()> {
        info!(
            to = to,
            subject = subject,
            "--- NOTIFICATION (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            to,
            subject,
            text_body
        );

        Ok(())
    }
}
