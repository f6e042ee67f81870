use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use gatehouse_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

/// Builds the canonical route table: exactly one route per operation,
/// admin surfaces behind the admin role, everything else behind the
/// authenticated session.
pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/api/admin/membership/applications",
            get(handlers::admin::list_applications_handler),
        )
        .route(
            "/api/admin/membership/review/{application_id}",
            put(handlers::admin::review_application_handler),
        )
        .route(
            "/api/admin/membership/review/bulk",
            post(handlers::admin::bulk_review_handler),
        )
        .route(
            "/api/admin/membership/audit-log",
            get(handlers::admin::list_audit_log_handler),
        )
        .route(
            "/api/admin/debug/status-consistency",
            get(handlers::admin::status_consistency_handler),
        )
        .route_layer(from_fn(middleware::require_admin));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/membership/application",
            post(handlers::membership::submit_application_handler),
        )
        .route(
            "/api/membership/application/answers",
            put(handlers::membership::amend_answers_handler),
        )
        .route(
            "/api/membership/application/withdraw",
            post(handlers::membership::withdraw_application_handler),
        )
        .route(
            "/api/membership/full-membership",
            post(handlers::membership::submit_full_membership_handler),
        )
        .route(
            "/api/membership/full-membership/reapply",
            post(handlers::membership::reapply_full_membership_handler),
        )
        .route(
            "/api/membership/full-membership/access",
            post(handlers::membership::record_access_handler),
        )
        .route(
            "/api/membership/full-membership-status",
            get(handlers::membership::full_membership_status_handler),
        )
        .route(
            "/api/membership/full-membership-status/{user_id}",
            get(handlers::membership::full_membership_status_for_user_handler),
        )
        .route(
            "/api/survey/check-status",
            get(handlers::membership::survey_check_status_handler),
        )
        .merge(admin_routes)
        .route_layer(from_fn(middleware::require_auth));

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .route("/api/auth/bootstrap", post(auth::bootstrap_handler));

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(session_layer)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(router)
}
