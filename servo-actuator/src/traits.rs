//! Actuator abstraction

use serde::{Deserialize, Serialize};
use crate::error::ActuatorResult;

/// Actuator status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorStatus {
    /// Not configured yet
    Uninitialized,
    /// Ready to take commands
    Ready,
    /// Executing a multi-step move
    Busy,
    /// Last peripheral write failed
    Fault,
    /// Output released after an emergency stop
    Off,
}

impl ActuatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActuatorStatus::Uninitialized => "uninitialized",
            ActuatorStatus::Ready => "ready",
            ActuatorStatus::Busy => "busy",
            ActuatorStatus::Fault => "fault",
            ActuatorStatus::Off => "off",
        }
    }
}

/// Anything that executes physical commands.
///
/// # Example
///
/// ```
/// use servo_actuator::{Actuator, ActuatorStatus, Angle, ServoDriver, SimulatedLedc};
///
/// let mut servo = ServoDriver::new(SimulatedLedc::new()).unwrap();
/// servo.configure().unwrap();
/// servo.send(Angle::CENTER).unwrap();
/// assert_eq!(servo.status(), ActuatorStatus::Ready);
/// ```
pub trait Actuator {
    /// Accepted command type
    type Command;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Sends a command to the actuator
    fn send(&mut self, cmd: Self::Command) -> ActuatorResult<()>;

    /// Current status
    fn status(&self) -> ActuatorStatus;

    /// Stops driving the output immediately
    fn emergency_stop(&mut self) -> ActuatorResult<()> {
        Ok(())
    }
}
