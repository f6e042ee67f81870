//! Application lifecycle types and transition rules.
//!
//! An application is created `Pending` and transitions exactly once to
//! `Approved` or `Declined` under an admin decision. Re-application after a
//! decline creates a new row; decided rows are immutable history.

use std::str::FromStr;

use gatehouse_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for an application record of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Creates a new random application identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an application identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses an application identifier from its string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid application id '{value}': {error}"))
        })
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The two application kinds. Identical lifecycle, distinct tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    /// First application in the pipeline; approval promotes to pre-member.
    Initial,
    /// Application for full membership; approval promotes to member.
    FullMembership,
}

impl ApplicationKind {
    /// Returns the storage string for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FullMembership => "full_membership",
        }
    }

    /// Parses a storage string into an application kind.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "initial" => Ok(Self::Initial),
            "full_membership" => Ok(Self::FullMembership),
            _ => Err(AppError::Validation(format!(
                "unknown application kind '{value}'"
            ))),
        }
    }
}

impl FromStr for ApplicationKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Lifecycle status of a stored application row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Awaiting an admin decision.
    Pending,
    /// Approved. Terminal.
    Approved,
    /// Declined. Terminal for this row; the user may re-apply with a new row.
    Declined,
}

impl ApplicationStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Parses a storage string into an application status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            _ => Err(AppError::Validation(format!(
                "unknown application status '{value}'"
            ))),
        }
    }

    /// Whether an admin decision may still be applied to this row.
    #[must_use]
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// An admin decision on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Approve the application.
    Approved,
    /// Decline the application.
    Declined,
}

impl ReviewDecision {
    /// Parses a client-supplied decision string.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            _ => Err(AppError::Validation(format!(
                "invalid decision '{value}': expected 'approved' or 'declined'"
            ))),
        }
    }

    /// Returns the storage string for this decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Returns the application status a decided row ends in.
    #[must_use]
    pub fn resulting_status(&self) -> ApplicationStatus {
        match self {
            Self::Approved => ApplicationStatus::Approved,
            Self::Declined => ApplicationStatus::Declined,
        }
    }
}

/// Maximum accepted ticket length.
pub const TICKET_MAX_LENGTH: usize = 64;

/// Human-readable identifier attached to a full-membership application at
/// submission time (e.g. `TCK-001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(String);

impl Ticket {
    /// Creates a validated ticket. Trims surrounding whitespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation("ticket must not be empty".to_owned()));
        }

        if trimmed.len() > TICKET_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "ticket must not exceed {TICKET_MAX_LENGTH} characters"
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(AppError::Validation(
                "ticket must not contain control characters".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the validated ticket string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Ticket> for String {
    fn from(value: Ticket) -> Self {
        value.0
    }
}

/// Validates a free-form answers payload.
///
/// Answers are opaque structured data, but must be a JSON object with at
/// least one field so an empty form cannot enter the review queue.
pub fn validate_answers(answers: &Value) -> AppResult<()> {
    let Some(fields) = answers.as_object() else {
        return Err(AppError::Validation(
            "answers must be a JSON object".to_owned(),
        ));
    };

    if fields.is_empty() {
        return Err(AppError::Validation(
            "answers must contain at least one field".to_owned(),
        ));
    }

    Ok(())
}
