//! Servo HTTP API
//!
//! Serves a control page and a small angle API on top of a shared
//! [`ServoHandle`].
//!
//! ## Endpoints
//! - `GET  /`                      - HTML slider page
//! - `GET  /angle`                 - `{"angle":N}` (also `/get_angle`)
//! - `POST /angle`                 - `angle=N` or `{"angle":N}` (also `/set_angle`)
//! - `GET  /health`                - Health check
//! - `GET  /api-docs/openapi.json` - OpenAPI document
//!
//! ## Environment Variables
//! - `SERVO_API_RATE_LIMIT`: Requests per second (default: 40)
//! - `SERVO_API_RATE_BURST`: Burst size (default: 60)
//! - `SERVO_API_RATE_ENABLED`: Enable rate limiting (default: true)

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;

use axum::middleware as axum_middleware;
use axum::Router;
use servo_actuator::ServoHandle;
use std::future::Future;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use middleware::{ApiConfig, RateLimitConfig, MAX_BODY_BYTES, MAX_CONCURRENT_REQUESTS};
pub use models::{AngleResponse, HealthCheck, SetAngleRequest};

/// State shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub servo: ServoHandle,
    /// Bytes of a request body read before the rest is ignored
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(servo: ServoHandle) -> Self {
        Self {
            servo,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Router with every route and middleware layer applied
pub fn build_app(state: AppState, config: &ApiConfig) -> Router {
    let rate_limiter = config.rate_limit.create_limiter();

    let state = AppState {
        max_body_bytes: config.max_body_bytes,
        ..state
    };

    let mut app = routes::create_router(state)
        .layer(axum_middleware::from_fn_with_state(
            (rate_limiter, config.rate_limit.clone()),
            middleware::rate_limit_middleware,
        ));

    if config.cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests.max(1)))
}

/// Serves `app` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("HTTP server started on http://{}", addr);
    info!("  GET  /angle   - current angle");
    info!("  POST /angle   - set angle (0-180)");
    info!("  GET  /health  - health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
