// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, session},
    state::AppState,
    utils::auth::{ADMIN_PASSWORD_HEADER, admin_middleware},
};

/// Assembles the main application router.
///
/// * Merges the candidate and admin sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, sessions, admin credential).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_PASSWORD_HEADER),
        ]);

    let session_routes = Router::new()
        .route("/", post(session::start_session))
        .route("/pool", get(session::pool_info))
        .route("/{token}", get(session::get_session))
        .route("/{token}/answers", put(session::record_answer))
        .route("/{token}/flags", put(session::flag_question))
        .route("/{token}/navigate", post(session::navigate))
        .route("/{token}/submit", post(session::submit));

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/active", put(admin::set_active_questions))
        .route("/submissions", get(admin::recent_submissions))
        .route("/responses", get(admin::list_responses))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .nest("/api/sessions", session_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
