//! Data models for API requests and responses

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Request Models
// ============================================================================

/// JSON body accepted by `POST /angle`.
///
/// The form-encoded `angle=<int>` body is accepted as well.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAngleRequest {
    /// Target angle in degrees (0-180)
    #[schema(example = 90, minimum = 0, maximum = 180)]
    pub angle: i64,
}

// ============================================================================
// Response Models
// ============================================================================

/// Current servo position
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AngleResponse {
    /// Last angle written to the servo
    #[schema(example = 90)]
    pub angle: i32,
}

/// Error information for JSON error responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "RATE_LIMITED")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Too many requests")]
    pub message: String,

    /// Helpful suggestion for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,

    /// Service version
    #[schema(example = "2026.10.19")]
    pub version: &'static str,

    /// Servo driver status
    #[schema(example = "ready")]
    pub servo: &'static str,
}
