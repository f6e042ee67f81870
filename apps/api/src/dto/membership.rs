use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use gatehouse_application::{AccessGrant, ApplicationRecord, MembershipStatusView, SurveyStatusView};

/// Incoming payload for an initial application submission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-application-request.ts"
)]
pub struct SubmitApplicationRequest {
    pub answers: Value,
}

/// Incoming payload for amending a pending application's answers.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/amend-answers-request.ts"
)]
pub struct AmendAnswersRequest {
    pub answers: Value,
}

/// Incoming payload for a full-membership submission or re-application.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-full-membership-request.ts"
)]
pub struct SubmitFullMembershipRequest {
    pub answers: Value,
    pub ticket: String,
}

/// Confirmation for a created application.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submission-response.ts"
)]
pub struct SubmissionResponse {
    pub application_id: String,
    pub status: String,
}

/// Confirmation for a withdrawn application.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/withdraw-response.ts"
)]
pub struct WithdrawResponse {
    pub application_id: String,
}

/// API representation of a stored application.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/application-response.ts"
)]
pub struct ApplicationResponse {
    pub application_id: String,
    pub user_id: String,
    pub kind: String,
    pub ticket: Option<String>,
    pub answers: Value,
    pub status: String,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
    pub reviewer_id: Option<String>,
    pub admin_notes: Option<String>,
}

impl From<ApplicationRecord> for ApplicationResponse {
    fn from(record: ApplicationRecord) -> Self {
        Self {
            application_id: record.id.to_string(),
            user_id: record.user_id.to_string(),
            kind: record.kind.as_str().to_owned(),
            ticket: record.ticket,
            answers: record.answers,
            status: record.status.as_str().to_owned(),
            submitted_at: format_timestamp(record.submitted_at),
            reviewed_at: record.reviewed_at.map(format_timestamp),
            reviewer_id: record.reviewer_id.map(|reviewer| reviewer.to_string()),
            admin_notes: record.admin_notes,
        }
    }
}

/// Projection of the full-membership pipeline for one user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/membership-status-response.ts"
)]
pub struct MembershipStatusResponse {
    pub user_id: String,
    pub status: String,
    pub ticket: Option<String>,
    pub applied_at: Option<String>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub answers: Option<Value>,
    pub membership_stage: String,
}

impl From<MembershipStatusView> for MembershipStatusResponse {
    fn from(view: MembershipStatusView) -> Self {
        Self {
            user_id: view.user_id.to_string(),
            status: view.status.as_str().to_owned(),
            ticket: view.ticket,
            applied_at: view.applied_at.map(format_timestamp),
            reviewed_at: view.reviewed_at.map(format_timestamp),
            admin_notes: view.admin_notes,
            answers: view.answers,
            membership_stage: view.membership_stage.as_str().to_owned(),
        }
    }
}

/// Merged survey + membership projection.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/survey-status-response.ts"
)]
pub struct SurveyStatusResponse {
    pub survey_status: String,
    pub full_membership_status: String,
    pub membership_stage: String,
    pub is_member: bool,
}

impl From<SurveyStatusView> for SurveyStatusResponse {
    fn from(view: SurveyStatusView) -> Self {
        Self {
            survey_status: view.survey_status.as_str().to_owned(),
            full_membership_status: view.full_membership_status.as_str().to_owned(),
            membership_stage: view.membership_stage.as_str().to_owned(),
            is_member: view.is_member,
        }
    }
}

/// Engagement counter state after a recorded access.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-grant-response.ts"
)]
pub struct AccessGrantResponse {
    pub user_id: String,
    pub first_accessed_at: Option<String>,
    pub access_count: i64,
}

impl From<AccessGrant> for AccessGrantResponse {
    fn from(grant: AccessGrant) -> Self {
        Self {
            user_id: grant.user_id.to_string(),
            first_accessed_at: grant.first_accessed_at.map(format_timestamp),
            access_count: grant.access_count,
        }
    }
}

pub(super) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
