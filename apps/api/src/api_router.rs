//! Route table and request-pipeline layers.

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use clearslip_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

/// Builds the API router; the session layer is attached by the caller since
/// its store type depends on the storage mode.
pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/accounts", post(auth::register_account_handler))
        .route(
            "/api/approvals",
            get(handlers::approvals::approval_history_handler),
        )
        .route(
            "/api/approvals/queue/{stage_kind}",
            get(handlers::approvals::pending_queue_handler),
        )
        .route(
            "/api/approvals/{student_id}",
            get(handlers::approvals::get_record_handler)
                .post(handlers::approvals::open_cycle_handler),
        )
        .route(
            "/api/approvals/{student_id}/decisions",
            post(handlers::approvals::decide_stage_handler),
        )
        .route(
            "/api/approvals/{student_id}/subjects/{subject_id}/verification",
            put(handlers::approvals::verify_subject_handler),
        )
        .route("/api/me/approval", get(handlers::approvals::my_record_handler))
        .route("/api/slips/{student_id}", get(handlers::issuance::slip_handler))
        .route("/api/tickets", get(handlers::issuance::ticket_queue_handler))
        .route(
            "/api/tickets/stats",
            get(handlers::issuance::distribution_stats_handler),
        )
        .route(
            "/api/tickets/{student_id}",
            post(handlers::issuance::issue_ticket_handler),
        )
        .route(
            "/api/students",
            get(handlers::directory::list_students_handler)
                .post(handlers::directory::register_student_handler),
        )
        .route(
            "/api/students/{student_id}",
            get(handlers::directory::get_student_handler),
        )
        .route(
            "/api/students/{student_id}/roster",
            put(handlers::directory::update_roster_handler),
        )
        .route(
            "/api/faculty",
            get(handlers::directory::list_faculty_handler)
                .post(handlers::directory::register_faculty_handler),
        )
        .route(
            "/api/faculty/{faculty_id}/assignments",
            put(handlers::directory::update_faculty_assignments_handler),
        )
        .route(
            "/api/departments",
            get(handlers::directory::list_departments_handler)
                .post(handlers::directory::register_department_handler),
        )
        .route(
            "/api/departments/{dept_id}/hod",
            put(handlers::directory::replace_hod_handler),
        )
        .route("/api/audit", get(handlers::audit::audit_log_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&state.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state))
}
