//! # servo-actuator — PWM servo driver
//!
//! Drives one hobby servo from a PWM timer/channel pair and keeps track of
//! the last angle committed to the output.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  console surface        HTTP surface      │
//! │        └──────┬──────────────┘            │
//! │          ServoHandle (Arc<Mutex<_>>)      │
//! │               ↓                           │
//! │          ServoDriver ── SmoothMove        │
//! │   angle → pulse width → duty (13-bit)     │
//! │               ↓                           │
//! │          PwmChannel trait                 │
//! └───────────────────────────────────────────┘
//!                 ↓
//!       LEDC timer 0 / channel 0 (GPIO 15)
//! ```
//!
//! ## Angle to duty
//!
//! `pulse = 500 + 2000 * angle / 180` µs, then
//! `duty = pulse * 8191 / 20000` at 50 Hz with 13-bit resolution. Integer
//! arithmetic throughout, truncating.
//!
//! ## Example
//!
//! ```rust
//! use servo_actuator::{ServoDriver, ServoHandle, SimulatedLedc};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ledc = SimulatedLedc::new();
//! let probe = ledc.probe();
//!
//! let servo = ServoHandle::new(ServoDriver::new(ledc)?);
//! servo.configure()?;
//!
//! servo.set_angle(90)?;
//! assert_eq!(probe.duty(), 614);
//!
//! // Out-of-range input is clamped
//! servo.set_angle(300)?;
//! assert_eq!(servo.current_angle()?.degrees(), 180);
//!
//! servo.smooth_move_to(170, 0)?;
//! assert_eq!(servo.current_angle()?.degrees(), 170);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handle;
pub mod motion;
pub mod pwm;
pub mod servo;
pub mod traits;
pub mod types;

pub use error::{ActuatorError, ActuatorResult, PwmError};
pub use handle::{DynServoDriver, ServoHandle};
pub use motion::{MoveOutcome, SmoothMove};
pub use pwm::{LedcProbe, LedcRegisters, PwmChannel, SimulatedLedc, LEDC_HISTORY_CAPACITY};
pub use servo::{MotionPoll, ServoConfig, ServoDriver, ServoState};
pub use traits::{Actuator, ActuatorStatus};
pub use types::{Angle, Direction, PwmTimerConfig};

#[cfg(test)]
mod tests;
