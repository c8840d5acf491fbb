//! Rate limiting and server-wide limits

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::models::ErrorBody;

/// Request body bytes read by `POST /angle`
pub const MAX_BODY_BYTES: usize = 256;

/// Requests served at the same time
pub const MAX_CONCURRENT_REQUESTS: usize = 7;

// ============================================================================
// Server configuration
// ============================================================================

/// Middleware settings for the router
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub rate_limit: RateLimitConfig,
    /// Allow cross-origin requests from anywhere
    pub cors: bool,
    pub max_body_bytes: usize,
    pub max_concurrent_requests: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            cors: false,
            max_body_bytes: MAX_BODY_BYTES,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
        }
    }
}

impl ApiConfig {
    /// Defaults with the rate limit taken from the environment
    pub fn from_env() -> Self {
        Self {
            rate_limit: RateLimitConfig::from_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Rate Limiting
// ============================================================================

/// Rate limiter type alias
pub type AppRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter configuration
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Requests per second
    pub requests_per_second: u32,
    /// Burst size
    pub burst_size: u32,
    /// Whether rate limiting is enabled
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // The slider page debounces at 30 ms, about 33 posts per second
        Self {
            requests_per_second: 40,
            burst_size: 60,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rps = std::env::var("SERVO_API_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.requests_per_second);

        let burst = std::env::var("SERVO_API_RATE_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.burst_size);

        let enabled = std::env::var("SERVO_API_RATE_ENABLED")
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);

        Self {
            requests_per_second: rps,
            burst_size: burst,
            enabled,
        }
    }

    /// Create a rate limiter from this config. Zero values count as one.
    pub fn create_limiter(&self) -> Arc<AppRateLimiter> {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Arc::new(RateLimiter::direct(quota))
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State((limiter, config)): State<(Arc<AppRateLimiter>, RateLimitConfig)>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Skip rate limiting for health check
    if request.uri().path() == "/health" || !config.enabled {
        return next.run(request).await;
    }

    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(path = %request.uri().path(), "request rate limited");
            let error = ErrorBody {
                code: "RATE_LIMITED".to_string(),
                message: "Too many requests".to_string(),
                help: Some(format!(
                    "Rate limit: {} requests/second, burst: {}",
                    config.requests_per_second, config.burst_size
                )),
            };
            (StatusCode::TOO_MANY_REQUESTS, Json(error)).into_response()
        }
    }
}
