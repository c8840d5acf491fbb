//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use servo_actuator::ActuatorError;
use thiserror::Error;

/// Errors a handler can answer with.
///
/// Bodies are plain text so simple clients can show them as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, empty or over the size limit
    #[error("Failed to receive data")]
    ReceiveFailed,

    /// Angle missing, unparseable or outside 0-180
    #[error("Invalid angle")]
    InvalidAngle,

    /// Driver refused the command
    #[error("Servo error: {0}")]
    Servo(#[from] ActuatorError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ReceiveFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidAngle => StatusCode::BAD_REQUEST,
            ApiError::Servo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
