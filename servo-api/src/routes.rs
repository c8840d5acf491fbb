//! Route configuration for the servo API

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))

        // Servo endpoints
        .route(
            "/angle",
            get(handlers::get_angle_handler).post(handlers::set_angle_handler),
        )

        // Paths served by earlier firmware builds
        .route("/get_angle", get(handlers::get_angle_handler))
        .route("/set_angle", post(handlers::set_angle_handler))

        // Health check and docs
        .route("/health", get(handlers::health_handler))
        .route("/api-docs/openapi.json", get(handlers::openapi_handler))
        .with_state(state)
}
