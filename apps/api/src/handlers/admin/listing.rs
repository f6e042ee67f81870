use gatehouse_application::ApplicationListFilter;

use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct ApplicationListQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_applications_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<UserIdentity>,
    Query(query): Query<ApplicationListQuery>,
) -> ApiResult<Json<ApiEnvelope<ApplicationListResponse>>> {
    let kind = parse_kind(&KindQuery {
        kind: query.kind.clone(),
    })?;
    let status = query
        .status
        .as_deref()
        .map(ApplicationStatus::parse)
        .transpose()?;
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let page = state
        .review_service
        .list_applications(ApplicationListFilter {
            kind,
            status,
            limit,
            offset,
        })
        .await?;

    Ok(Json(ApiEnvelope::new(ApplicationListResponse::from_page(
        page, limit, offset,
    ))))
}
