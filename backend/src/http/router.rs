//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Default request body limit (10 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    create_router_with_limit(state, DEFAULT_BODY_LIMIT)
}

/// Same as [`create_router`] with a custom request body limit in bytes.
pub fn create_router_with_limit(state: AppState, body_limit: usize) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timetables = Router::new()
        .route("/generate/{class_id}", post(handlers::generate_timetable))
        .route("/class/{class_id}", get(handlers::get_class_timetables))
        .route("/teacher/{teacher_id}", get(handlers::get_teacher_timetables))
        .route(
            "/{id}",
            get(handlers::get_timetable).delete(handlers::delete_timetable),
        )
        .route("/{id}/options", get(handlers::get_editor_options))
        .route("/{id}/validate-slot", post(handlers::validate_slot))
        .route("/{id}/edit", put(handlers::edit_timetable))
        .route("/{id}/history", get(handlers::get_history))
        .route("/{id}/revert/{version}", post(handlers::revert_timetable))
        .route("/{id}/publish", put(handlers::publish_timetable))
        .route("/{id}/archive", put(handlers::archive_timetable))
        .route("/{id}/sessions", post(handlers::open_session));

    let sessions = Router::new()
        .route(
            "/{session_id}",
            get(handlers::get_session).delete(handlers::discard_session),
        )
        .route("/{session_id}/slots", put(handlers::set_slot))
        .route("/{session_id}/move", post(handlers::move_slot))
        .route("/{session_id}/drop-zones", post(handlers::drop_zones))
        .route("/{session_id}/commit", post(handlers::commit_session));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/timetables", get(handlers::list_timetables))
        .nest("/timetables", timetables)
        .nest("/sessions", sessions)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
