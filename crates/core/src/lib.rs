//! Shared primitives for all Rust crates in Gatehouse.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{ADMIN_ROLE, UserIdentity};

/// Result type used across Gatehouse crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Every category carries a stable `error_type` tag surfaced to API clients
/// alongside the human-readable message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or malformed field.
    #[error("validation error: {0}")]
    Validation(String),

    /// The user's membership stage does not permit the requested action.
    #[error("ineligible state: {0}")]
    IneligibleState(String),

    /// An unresolved application of the same kind already exists.
    #[error("duplicate pending application: {0}")]
    DuplicatePending(String),

    /// The application was already decided by another reviewer.
    #[error("already reviewed: {0}")]
    AlreadyReviewed(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by role or ownership policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A storage transaction aborted and was rolled back. Safe to retry.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// The store did not respond within the driver deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable machine-readable tag for this error category.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::IneligibleState(_) => "IneligibleState",
            Self::DuplicatePending(_) => "DuplicatePending",
            Self::AlreadyReviewed(_) => "AlreadyReviewed",
            Self::NotFound(_) => "NotFound",
            Self::Unauthorized(_) => "AuthenticationError",
            Self::Forbidden(_) => "AuthorizationError",
            Self::TransactionFailed(_) => "TransactionFailed",
            Self::Timeout(_) => "TimeoutError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Whether a caller may safely retry the failed operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionFailed(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn error_types_are_stable_tags() {
        assert_eq!(
            AppError::DuplicatePending(String::new()).error_type(),
            "DuplicatePending"
        );
        assert_eq!(
            AppError::AlreadyReviewed(String::new()).error_type(),
            "AlreadyReviewed"
        );
        assert_eq!(
            AppError::Forbidden(String::new()).error_type(),
            "AuthorizationError"
        );
    }

    #[test]
    fn transaction_failures_are_retryable() {
        assert!(AppError::TransactionFailed(String::new()).is_retryable());
        assert!(!AppError::AlreadyReviewed(String::new()).is_retryable());
    }
}
