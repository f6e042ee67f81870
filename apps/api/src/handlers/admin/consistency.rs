use axum::response::{IntoResponse, Response};

use gatehouse_domain::UserId;

use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct ConsistencyQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

pub async fn status_consistency_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<UserIdentity>,
    Query(query): Query<ConsistencyQuery>,
) -> ApiResult<Response> {
    if let Some(raw_user_id) = query.user_id.as_deref() {
        let user_id = UserId::parse(raw_user_id)?;
        let report = state.status_service.check_consistency(user_id).await?;

        return Ok(Json(ApiEnvelope::new(ConsistencyReportResponse::from(report))).into_response());
    }

    let reports = state
        .status_service
        .check_all(query.limit.unwrap_or(50))
        .await?;

    let reports: Vec<ConsistencyReportResponse> = reports
        .into_iter()
        .map(ConsistencyReportResponse::from)
        .collect();

    Ok(Json(ApiEnvelope::new(reports)).into_response())
}
