//! Data types for the servo actuator

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{ActuatorError, ActuatorResult};

/// Servo position in whole degrees (0 to 180)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Angle(u8);

impl Angle {
    /// Lowest commandable angle
    pub const MIN: Angle = Angle(0);
    /// Highest commandable angle
    pub const MAX: Angle = Angle(180);
    /// Center position
    pub const CENTER: Angle = Angle(90);

    /// Clamps any integer into [0, 180]. Never fails.
    pub fn clamped(degrees: i32) -> Self {
        Self(degrees.clamp(0, 180) as u8)
    }

    /// Accepts only values already inside [0, 180]
    pub fn try_from_degrees(degrees: i32) -> ActuatorResult<Self> {
        if !(0..=180).contains(&degrees) {
            return Err(ActuatorError::OutOfRange(format!(
                "Servo angle must be 0-180°, got {}°",
                degrees
            )));
        }
        Ok(Self(degrees as u8))
    }

    /// Angle in degrees
    pub fn degrees(self) -> i32 {
        self.0 as i32
    }

    /// One degree towards `target`, or `self` when already there
    pub fn step_towards(self, target: Angle) -> Angle {
        match self.cmp(&target) {
            std::cmp::Ordering::Less => Angle(self.0 + 1),
            std::cmp::Ordering::Greater => Angle(self.0 - 1),
            std::cmp::Ordering::Equal => self,
        }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle::MIN
    }
}

impl TryFrom<i32> for Angle {
    type Error = ActuatorError;

    fn try_from(degrees: i32) -> ActuatorResult<Self> {
        Angle::try_from_degrees(degrees)
    }
}

impl From<Angle> for i32 {
    fn from(angle: Angle) -> Self {
        angle.degrees()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Direction of a multi-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    /// +1 when the target is above `from`, -1 otherwise (including equal)
    pub fn between(from: Angle, to: Angle) -> Self {
        if to > from {
            Direction::Increasing
        } else {
            Direction::Decreasing
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            Direction::Increasing => 1,
            Direction::Decreasing => -1,
        }
    }
}

/// Timer parameters handed to the PWM peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmTimerConfig {
    /// Timer index (LEDC timer 0-3)
    pub timer: u8,
    /// Channel index (LEDC channel 0-7)
    pub channel: u8,
    /// Output GPIO
    pub gpio: u8,
    /// PWM frequency (Hz)
    pub frequency_hz: u32,
    /// Duty resolution (bits)
    pub resolution_bits: u8,
}

impl PwmTimerConfig {
    /// Largest duty value at this resolution
    pub fn max_duty(&self) -> u32 {
        (1u32 << self.resolution_bits) - 1
    }

    /// PWM period in microseconds
    pub fn period_us(&self) -> u32 {
        1_000_000 / self.frequency_hz
    }
}
