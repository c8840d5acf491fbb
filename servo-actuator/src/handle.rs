//! Shared servo handle
//!
//! Both command surfaces hold a clone of the same [`ServoHandle`]. Every
//! duty write and the matching angle update happen under one mutex, and the
//! lock is never held while waiting between smooth-move steps, so a command
//! from another context can always get in and preempt a move.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use crate::error::{ActuatorError, ActuatorResult};
use crate::motion::MoveOutcome;
use crate::pwm::PwmChannel;
use crate::servo::{MotionPoll, ServoDriver, ServoState};
use crate::traits::{Actuator, ActuatorStatus};
use crate::types::Angle;

/// Driver with its channel type erased
pub type DynServoDriver = ServoDriver<Box<dyn PwmChannel>>;

/// Cloneable, thread-safe access to one servo
#[derive(Clone)]
pub struct ServoHandle {
    driver: Arc<Mutex<DynServoDriver>>,
}

impl std::fmt::Debug for ServoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServoHandle").finish_non_exhaustive()
    }
}

impl ServoHandle {
    pub fn new<P: PwmChannel + 'static>(driver: ServoDriver<P>) -> Self {
        Self {
            driver: Arc::new(Mutex::new(driver.into_boxed())),
        }
    }

    fn lock(&self) -> ActuatorResult<MutexGuard<'_, DynServoDriver>> {
        self.driver
            .lock()
            .map_err(|_| ActuatorError::InvalidState("servo lock poisoned".into()))
    }

    /// Runs `f` with exclusive access to the driver
    pub fn with_driver<T>(&self, f: impl FnOnce(&mut DynServoDriver) -> T) -> ActuatorResult<T> {
        let mut driver = self.lock()?;
        Ok(f(&mut driver))
    }

    pub fn configure(&self) -> ActuatorResult<()> {
        self.lock()?.configure()
    }

    /// Clamps and applies `degrees`, preempting any smooth move
    pub fn set_angle(&self, degrees: i32) -> ActuatorResult<Angle> {
        self.lock()?.set_angle(degrees)
    }

    pub fn current_angle(&self) -> ActuatorResult<Angle> {
        Ok(self.lock()?.current_angle())
    }

    /// Moves one degree at a time to `target`, blocking the caller.
    ///
    /// Returns [`MoveOutcome::Preempted`] if another command was issued
    /// through any clone of this handle while the move was running.
    pub fn smooth_move_to(&self, target: i32, step_delay_ms: u32) -> ActuatorResult<MoveOutcome> {
        let step_delay = Duration::from_millis(step_delay_ms as u64);
        let id = self.lock()?.start_smooth_move(target, step_delay)?;

        loop {
            let now = Instant::now();
            let deadline = {
                let mut driver = self.lock()?;
                match driver.tick_motion(id, now)? {
                    MotionPoll::Pending(deadline) => deadline,
                    MotionPoll::Done(angle) => return Ok(MoveOutcome::Completed(angle)),
                    MotionPoll::Superseded => {
                        let at = driver.current_angle();
                        info!(at = at.degrees(), "smooth move preempted by a newer command");
                        return Ok(MoveOutcome::Preempted { at });
                    }
                }
            };
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
    }

    pub fn state(&self) -> ActuatorResult<ServoState> {
        Ok(self.lock()?.state().clone())
    }

    pub fn status(&self) -> ActuatorResult<ActuatorStatus> {
        Ok(self.lock()?.status())
    }

    pub fn emergency_stop(&self) -> ActuatorResult<()> {
        self.lock()?.emergency_stop()
    }
}
