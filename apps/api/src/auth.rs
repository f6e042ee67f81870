//! Session establishment for the narrow identity interface.
//!
//! Real login and SSO belong to the identity provider in front of this
//! service. The bootstrap endpoint below is the stand-in contract: a
//! token-guarded call that establishes the session principal and
//! guarantees a matching user row exists.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use gatehouse_application::NewAuditLogEntry;
use gatehouse_core::{AppError, UserIdentity};
use gatehouse_domain::UserId;
use serde::Deserialize;
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp for absolute timeout enforcement.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    /// User id to bind the session to; a fresh one is generated when absent.
    pub subject: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
}

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user_id = match payload.subject.as_deref() {
        Some(subject) => UserId::parse(subject)?,
        None => UserId::new(),
    };

    let display_name = payload
        .display_name
        .unwrap_or_else(|| user_id.to_string());
    let roles = payload.roles.unwrap_or_else(|| vec!["member".to_owned()]);

    let profile = state
        .profiles
        .ensure_profile(user_id, display_name.as_str(), payload.email.as_deref())
        .await?;

    let identity = UserIdentity::new(
        user_id.to_string(),
        profile.display_name.clone(),
        profile.email.clone(),
        roles,
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    state
        .audit_log_service
        .record(NewAuditLogEntry {
            actor: user_id.to_string(),
            action: "auth.session.bootstrapped".to_owned(),
            resource_type: "session".to_owned(),
            resource_id: user_id.to_string(),
            detail: None,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extension(identity): Extension<UserIdentity>,
) -> Json<UserIdentityResponse> {
    Json(UserIdentityResponse::from(identity))
}
