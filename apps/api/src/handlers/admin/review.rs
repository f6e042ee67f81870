use super::*;

pub async fn review_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(application_id): Path<uuid::Uuid>,
    Query(kind_query): Query<KindQuery>,
    Json(payload): Json<ReviewRequest>,
) -> ApiResult<Json<ApiEnvelope<ReviewResponse>>> {
    let kind = parse_kind(&kind_query)?;

    let outcome = state
        .review_service
        .review(
            &user,
            kind,
            ApplicationId::from_uuid(application_id),
            payload.decision.as_str(),
            payload.admin_notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiEnvelope::new(ReviewResponse::from(outcome))))
}

pub async fn bulk_review_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(kind_query): Query<KindQuery>,
    Json(payload): Json<BulkReviewRequest>,
) -> ApiResult<Json<ApiEnvelope<BulkReviewResponse>>> {
    let kind = parse_kind(&kind_query)?;

    let application_ids = payload
        .application_ids
        .iter()
        .map(|raw| ApplicationId::parse(raw))
        .collect::<AppResult<Vec<_>>>()?;

    let outcome = state
        .review_service
        .bulk_review(
            &user,
            kind,
            &application_ids,
            payload.decision.as_str(),
            payload.admin_notes.as_deref(),
        )
        .await?;

    Ok(Json(ApiEnvelope::new(BulkReviewResponse::from(outcome))))
}
