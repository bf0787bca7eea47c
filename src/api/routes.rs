//! REST API routes configuration

use crate::api::handlers::{self, ApiError, ApiState};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for anything that is not a known route
async fn fallback_handler(uri: axum::http::Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: format!("No route for {}", uri.path()),
        }),
    )
        .into_response()
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authority state
        .route("/api/safe", get(handlers::get_safe))
        // Proposals
        .route("/api/proposals", get(handlers::list_proposals))
        .route("/api/proposals/{hash}", get(handlers::get_proposal))
        .route(
            "/api/proposals/owners/add",
            post(handlers::propose_add_owner),
        )
        .route(
            "/api/proposals/owners/remove",
            post(handlers::propose_remove_owner),
        )
        .route(
            "/api/proposals/owners/swap",
            post(handlers::propose_swap_owner),
        )
        .route("/api/proposals/threshold", post(handlers::propose_threshold))
        .route("/api/proposals/upgrade", post(handlers::propose_upgrade))
        // Signatures and execution
        .route(
            "/api/proposals/{hash}/signatures",
            post(handlers::submit_signature),
        )
        .route(
            "/api/proposals/{hash}/execute",
            post(handlers::execute_proposal),
        )
        .fallback(fallback_handler)
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}
