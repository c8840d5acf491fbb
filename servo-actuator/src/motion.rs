//! Smooth motion as a cooperative state machine
//!
//! A [`SmoothMove`] never sleeps. Whoever drives it (a blocking loop, a timer
//! tick, an async task) calls [`SmoothMove::poll`] with the current instant
//! and applies the angle it hands back. The step sequence is
//! `start, start±1, ..., target`: the start angle is re-applied first and the
//! target is always the last step, with `step_delay` between consecutive
//! steps.

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use crate::types::{Angle, Direction};

/// Result of a smooth move driven to its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Target reached
    Completed(Angle),
    /// Another command took over; `at` is the angle on the output when it did
    Preempted { at: Angle },
}

impl MoveOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MoveOutcome::Completed(_))
    }
}

/// One-degree-per-step transition towards a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothMove {
    next: Angle,
    target: Angle,
    direction: Direction,
    step_delay: Duration,
    next_step_at: Option<Instant>,
    finished: bool,
}

impl SmoothMove {
    pub fn new(start: Angle, target: Angle, step_delay: Duration) -> Self {
        Self {
            next: start,
            target,
            direction: Direction::between(start, target),
            step_delay,
            next_step_at: None,
            finished: false,
        }
    }

    /// Returns the angle due at `now`, if any, and advances the machine
    pub fn poll(&mut self, now: Instant) -> Option<Angle> {
        if self.finished {
            return None;
        }
        if let Some(deadline) = self.next_step_at {
            if now < deadline {
                return None;
            }
        }

        let angle = self.next;
        if angle == self.target {
            self.finished = true;
            self.next_step_at = None;
        } else {
            self.next = angle.step_towards(self.target);
            self.next_step_at = Some(now + self.step_delay);
        }
        Some(angle)
    }

    /// When the next step becomes due; `None` if due now or finished
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.finished {
            None
        } else {
            self.next_step_at
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn target(&self) -> Angle {
        self.target
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Steps still to be applied, the final target included
    pub fn remaining_steps(&self) -> usize {
        if self.finished {
            0
        } else {
            (self.target.degrees() - self.next.degrees()).unsigned_abs() as usize + 1
        }
    }

    /// Full travel time from now if no step is late
    pub fn remaining_time(&self) -> Duration {
        let gaps = self.remaining_steps().saturating_sub(1) as u32;
        self.step_delay * gaps
    }
}
