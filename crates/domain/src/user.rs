//! User-side membership types.
//!
//! The membership stage is the user's position in the admission pipeline;
//! the per-kind application status mirrors exist so read paths can render a
//! profile without joining the application tables.

use std::str::FromStr;

use gatehouse_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The user's current tier in the admission pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStage {
    /// Registered, initial application not yet approved.
    Applicant,
    /// Initial application approved; may apply for full membership.
    PreMember,
    /// Full membership approved.
    Member,
}

impl MembershipStage {
    /// Returns the storage string for this stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::PreMember => "pre_member",
            Self::Member => "member",
        }
    }

    /// Parses a storage string into a membership stage.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "applicant" => Ok(Self::Applicant),
            "pre_member" => Ok(Self::PreMember),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!(
                "unknown membership stage '{value}'"
            ))),
        }
    }
}

impl FromStr for MembershipStage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Denormalized per-kind application status stored on the user record.
///
/// `NotApplied` is the sentinel for "no application row exists" and never
/// appears on an application row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserApplicationStatus {
    /// No application has been submitted.
    NotApplied,
    /// An application is awaiting review.
    Pending,
    /// The most recent application was approved.
    Approved,
    /// The most recent application was declined.
    Declined,
}

impl UserApplicationStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotApplied => "not_applied",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Parses a storage string into a mirror status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "not_applied" => Ok(Self::NotApplied),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            _ => Err(AppError::Validation(format!(
                "unknown user application status '{value}'"
            ))),
        }
    }
}
