use super::*;

pub async fn full_membership_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ApiEnvelope<MembershipStatusResponse>>> {
    let view = state
        .status_service
        .full_membership_status(&user, None)
        .await?;

    Ok(Json(ApiEnvelope::new(MembershipStatusResponse::from(view))))
}

pub async fn full_membership_status_for_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<uuid::Uuid>,
) -> ApiResult<Json<ApiEnvelope<MembershipStatusResponse>>> {
    let view = state
        .status_service
        .full_membership_status(&user, Some(UserId::from_uuid(user_id)))
        .await?;

    Ok(Json(ApiEnvelope::new(MembershipStatusResponse::from(view))))
}

pub async fn survey_check_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ApiEnvelope<SurveyStatusResponse>>> {
    let view = state.status_service.survey_status(&user).await?;

    Ok(Json(ApiEnvelope::new(SurveyStatusResponse::from(view))))
}
