use std::env;

use gatehouse_core::AppError;

/// SMTP runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Selected notification transport.
#[derive(Debug, Clone)]
pub enum NotificationProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

/// Environment-derived API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub dev_seed: bool,
    pub notification_provider: NotificationProviderConfig,
}

impl ApiConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_env("AUTH_BOOTSTRAP_TOKEN")?;

        if bootstrap_token.len() < 32 {
            return Err(AppError::Validation(
                "AUTH_BOOTSTRAP_TOKEN must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let dev_seed = env::var("DEV_SEED")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let notification_provider =
            match env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned()) {
                provider if provider.eq_ignore_ascii_case("smtp") => {
                    NotificationProviderConfig::Smtp(SmtpRuntimeConfig {
                        host: required_env("SMTP_HOST")?,
                        port: env::var("SMTP_PORT")
                            .ok()
                            .and_then(|value| value.parse::<u16>().ok())
                            .unwrap_or(587),
                        username: required_env("SMTP_USERNAME")?,
                        password: required_env("SMTP_PASSWORD")?,
                        from_address: required_env("SMTP_FROM_ADDRESS")?,
                    })
                }
                _ => NotificationProviderConfig::Console,
            };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            dev_seed,
            notification_provider,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::Validation(format!("{name} environment variable is required")))
}
