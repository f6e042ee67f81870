use gatehouse_application::SubmissionReceipt;

use super::*;

fn receipt_response(receipt: SubmissionReceipt) -> SubmissionResponse {
    SubmissionResponse {
        application_id: receipt.application_id.to_string(),
        status: receipt.status.as_str().to_owned(),
    }
}

pub async fn submit_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubmitApplicationRequest>,
) -> ApiResult<(StatusCode, Json<ApiEnvelope<SubmissionResponse>>)> {
    let receipt = state
        .submission_service
        .submit_initial(&user, payload.answers)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::new(receipt_response(receipt))),
    ))
}

pub async fn amend_answers_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<AmendAnswersRequest>,
) -> ApiResult<Json<ApiEnvelope<ApplicationResponse>>> {
    let record = state
        .submission_service
        .amend_initial_answers(&user, payload.answers)
        .await?;

    Ok(Json(ApiEnvelope::new(ApplicationResponse::from(record))))
}

pub async fn withdraw_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ApiEnvelope<WithdrawResponse>>> {
    let application_id = state.submission_service.withdraw_initial(&user).await?;

    Ok(Json(ApiEnvelope::with_message(
        WithdrawResponse {
            application_id: application_id.to_string(),
        },
        "application withdrawn",
    )))
}

pub async fn submit_full_membership_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubmitFullMembershipRequest>,
) -> ApiResult<(StatusCode, Json<ApiEnvelope<SubmissionResponse>>)> {
    let receipt = state
        .submission_service
        .submit_full_membership(&user, payload.answers, payload.ticket.as_str())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::new(receipt_response(receipt))),
    ))
}

pub async fn reapply_full_membership_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubmitFullMembershipRequest>,
) -> ApiResult<(StatusCode, Json<ApiEnvelope<SubmissionResponse>>)> {
    let receipt = state
        .submission_service
        .reapply_full_membership(&user, payload.answers, payload.ticket.as_str())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::new(receipt_response(receipt))),
    ))
}

pub async fn record_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ApiEnvelope<AccessGrantResponse>>> {
    let grant = state.status_service.record_access(&user).await?;

    Ok(Json(ApiEnvelope::new(AccessGrantResponse::from(grant))))
}
