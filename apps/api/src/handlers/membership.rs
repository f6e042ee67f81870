use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use gatehouse_core::UserIdentity;
use gatehouse_domain::UserId;

use crate::dto::{
    AccessGrantResponse, AmendAnswersRequest, ApiEnvelope, ApplicationResponse,
    MembershipStatusResponse, SubmissionResponse, SubmitApplicationRequest,
    SubmitFullMembershipRequest, SurveyStatusResponse, WithdrawResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod status;
mod submission;

pub use status::{
    full_membership_status_for_user_handler, full_membership_status_handler,
    survey_check_status_handler,
};
pub use submission::{
    amend_answers_handler, reapply_full_membership_handler, record_access_handler,
    submit_application_handler, submit_full_membership_handler, withdraw_application_handler,
};
