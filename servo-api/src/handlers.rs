//! Request handlers for API endpoints

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{header, HeaderMap},
    response::Html,
    Json,
};
use std::future::poll_fn;
use std::pin::Pin;
use tracing::{error, info, warn};
use utoipa::OpenApi;

use crate::error::ApiError;
use crate::models::*;
use crate::openapi::ApiDoc;
use crate::AppState;

const INDEX_HTML: &str = include_str!("index.html");

// ============================================================================
// Body parsing
// ============================================================================

/// Reads at most `limit` bytes of `body`; the rest is left unread.
pub async fn read_body_prefix(mut body: Body, limit: usize) -> Result<Vec<u8>, axum::Error> {
    let mut buf = Vec::new();
    while buf.len() < limit {
        let Some(frame) = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await else {
            break;
        };
        if let Ok(data) = frame?.into_data() {
            let take = data.len().min(limit - buf.len());
            buf.extend_from_slice(&data[..take]);
        }
    }
    Ok(buf)
}

/// Reads the integer after `angle=` in a form body.
///
/// Leading whitespace and a sign are accepted before the digits, and
/// anything after them is ignored, so `angle=90&x=1` yields 90.
pub fn parse_form_angle(body: &str) -> Option<i64> {
    let value = body
        .split('&')
        .find_map(|field| field.strip_prefix("angle="))?
        .trim_start();

    let (sign, digits) = match value.as_bytes().first()? {
        b'-' => (-1, &value[1..]),
        b'+' => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Extracts the requested angle from either body encoding
fn requested_angle(headers: &HeaderMap, body: &[u8]) -> Option<i64> {
    if is_json(headers) {
        serde_json::from_slice::<SetAngleRequest>(body)
            .ok()
            .map(|req| req.angle)
    } else {
        std::str::from_utf8(body).ok().and_then(parse_form_angle)
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Control page with a slider bound to `POST /angle`
#[utoipa::path(
    get,
    path = "/",
    tag = "servo",
    responses((status = 200, description = "HTML control page", content_type = "text/html"))
)]
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Current servo angle
#[utoipa::path(
    get,
    path = "/angle",
    tag = "servo",
    responses(
        (status = 200, description = "Last angle written", body = AngleResponse),
        (status = 500, description = "Driver unavailable", body = String),
    )
)]
pub async fn get_angle_handler(State(state): State<AppState>) -> Result<Json<AngleResponse>, ApiError> {
    let angle = state.servo.current_angle()?;
    Ok(Json(AngleResponse {
        angle: angle.degrees(),
    }))
}

/// Move the servo to an angle in 0-180.
///
/// Only the first `max_body_bytes` of the body are read.
#[utoipa::path(
    post,
    path = "/angle",
    tag = "servo",
    request_body(
        content = SetAngleRequest,
        description = "`angle=<int>` form body, or JSON when the content type is application/json"
    ),
    responses(
        (status = 200, description = "Angle applied", body = String),
        (status = 400, description = "Invalid angle", body = String),
        (status = 500, description = "Failed to receive data or servo fault", body = String),
    )
)]
pub async fn set_angle_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<&'static str, ApiError> {
    let body = match read_body_prefix(body, state.max_body_bytes).await {
        Ok(body) if !body.is_empty() => body,
        Ok(_) => {
            warn!("empty angle request body");
            return Err(ApiError::ReceiveFailed);
        }
        Err(e) => {
            warn!(error = %e, "failed to read angle request body");
            return Err(ApiError::ReceiveFailed);
        }
    };

    let angle = match requested_angle(&headers, &body) {
        Some(angle) if (0..=180).contains(&angle) => angle as i32,
        requested => {
            warn!(?requested, "rejected angle request");
            return Err(ApiError::InvalidAngle);
        }
    };

    match state.servo.set_angle(angle) {
        Ok(applied) => {
            info!(angle = applied.degrees(), "angle set over HTTP");
            Ok("OK")
        }
        Err(e) => {
            error!(error = %e, "servo write failed");
            Err(e.into())
        }
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthCheck))
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthCheck> {
    let servo = state
        .servo
        .status()
        .map(|s| s.as_str())
        .unwrap_or("unavailable");
    Json(HealthCheck {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        servo,
    })
}

/// OpenAPI document
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
