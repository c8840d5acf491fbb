//! Actuator layer errors

use thiserror::Error;

pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Errors raised by the PWM peripheral itself
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PwmError {
    /// Requested timer resolution is not supported
    #[error("Unsupported duty resolution: {0} bits")]
    UnsupportedResolution(u8),

    /// Timer cannot produce the frequency at this resolution
    #[error("Frequency {frequency_hz} Hz not reachable with {resolution_bits}-bit resolution")]
    FrequencyOutOfReach { frequency_hz: u32, resolution_bits: u8 },

    /// Duty value above the timer's maximum
    #[error("Duty {duty} exceeds maximum {max}")]
    DutyOutOfRange { duty: u32, max: u32 },

    /// Channel used before the timer was configured
    #[error("Channel not configured")]
    NotConfigured,

    /// Register write rejected by the hardware
    #[error("Register write failed: {0}")]
    WriteFailed(String),
}

/// Actuator errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Peripheral fault (configuration or duty write)
    #[error("Actuator fault: {0}")]
    Fault(#[from] PwmError),

    /// Angle outside the accepted range
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Hardware not initialized
    #[error("Hardware not initialized")]
    NotInitialized,
}

impl ActuatorError {
    /// True for errors coming from the peripheral rather than the caller
    pub fn is_fault(&self) -> bool {
        matches!(self, ActuatorError::Fault(_))
    }
}
