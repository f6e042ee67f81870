use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct AuditLogListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub actor: Option<String>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<UserIdentity>,
    Query(query): Query<AuditLogListQuery>,
) -> ApiResult<Json<ApiEnvelope<Vec<AuditLogEntryResponse>>>> {
    let entries = state
        .audit_log_service
        .list_recent(gatehouse_application::AuditLogQuery {
            limit: query.limit.unwrap_or(50),
            offset: query.offset.unwrap_or(0),
            action: query.action,
            actor: query.actor,
        })
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(ApiEnvelope::new(entries)))
}
