//! Servo driver

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::error::{ActuatorError, ActuatorResult};
use crate::motion::SmoothMove;
use crate::pwm::PwmChannel;
use crate::traits::{Actuator, ActuatorStatus};
use crate::types::{Angle, PwmTimerConfig};

/// Default output pin
pub const SERVO_GPIO: u8 = 15;
/// Pulse width at 0° (µs)
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180° (µs)
pub const SERVO_MAX_PULSE_US: u32 = 2500;
/// Standard hobby servo refresh rate
pub const SERVO_FREQ_HZ: u32 = 50;
/// Duty granularity
pub const SERVO_RESOLUTION_BITS: u8 = 13;

/// Servo configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Servo name
    pub name: String,
    /// Output GPIO
    pub gpio: u8,
    /// LEDC timer index
    pub timer: u8,
    /// LEDC channel index
    pub channel: u8,
    /// Pulse width at 0° (µs)
    pub min_pulse_us: u32,
    /// Pulse width at 180° (µs)
    pub max_pulse_us: u32,
    /// PWM frequency (Hz)
    pub frequency_hz: u32,
    /// Duty resolution (bits)
    pub resolution_bits: u8,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            name: "servo".to_string(),
            gpio: SERVO_GPIO,
            timer: 0,
            channel: 0,
            min_pulse_us: SERVO_MIN_PULSE_US,
            max_pulse_us: SERVO_MAX_PULSE_US,
            frequency_hz: SERVO_FREQ_HZ,
            resolution_bits: SERVO_RESOLUTION_BITS,
        }
    }
}

impl ServoConfig {
    /// Checks pulse range against the PWM period
    pub fn validate(&self) -> ActuatorResult<()> {
        if self.frequency_hz == 0 {
            return Err(ActuatorError::InvalidConfig("frequency must be non-zero".into()));
        }
        if self.resolution_bits == 0 || self.resolution_bits > 31 {
            return Err(ActuatorError::InvalidConfig(format!(
                "resolution of {} bits is not usable",
                self.resolution_bits
            )));
        }
        if self.min_pulse_us >= self.max_pulse_us {
            return Err(ActuatorError::InvalidConfig(
                "min_pulse_us must be less than max_pulse_us".into(),
            ));
        }
        let period = self.timer_config().period_us();
        if self.max_pulse_us > period {
            return Err(ActuatorError::InvalidConfig(format!(
                "max pulse {}µs does not fit in a {}µs period",
                self.max_pulse_us, period
            )));
        }
        Ok(())
    }

    /// Timer/channel parameters for the peripheral
    pub fn timer_config(&self) -> PwmTimerConfig {
        PwmTimerConfig {
            timer: self.timer,
            channel: self.channel,
            gpio: self.gpio,
            frequency_hz: self.frequency_hz,
            resolution_bits: self.resolution_bits,
        }
    }

    /// Linear map from angle to pulse width (µs)
    pub fn pulse_width_us(&self, angle: Angle) -> u32 {
        let span = self.max_pulse_us - self.min_pulse_us;
        self.min_pulse_us + span * angle.degrees() as u32 / 180
    }

    /// Pulse width rescaled into the timer's duty domain, truncated
    pub fn duty_for(&self, angle: Angle) -> u32 {
        let timer = self.timer_config();
        let pulse = self.pulse_width_us(angle) as u64;
        (pulse * timer.max_duty() as u64 / timer.period_us() as u64) as u32
    }
}

/// Driver state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoState {
    /// Last angle committed to the output
    pub current_angle: Angle,
    /// Duty of the last successful write
    pub last_duty: Option<u32>,
    pub status: ActuatorStatus,
    /// Successful duty writes
    pub moves: u64,
    /// Bumped by every command; identifies the owner of a smooth move
    pub generation: u64,
}

impl ServoState {
    pub fn new() -> Self {
        Self {
            current_angle: Angle::MIN,
            last_duty: None,
            status: ActuatorStatus::Uninitialized,
            moves: 0,
            generation: 0,
        }
    }
}

impl Default for ServoState {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of a smooth move as seen by the context that started it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPoll {
    /// Next step due at this instant
    Pending(Instant),
    /// Target reached
    Done(Angle),
    /// A newer command replaced this move
    Superseded,
}

/// PWM servo driver
pub struct ServoDriver<P: PwmChannel> {
    pwm: P,
    config: ServoConfig,
    state: ServoState,
    motion: Option<(u64, SmoothMove)>,
}

impl<P: PwmChannel> std::fmt::Debug for ServoDriver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServoDriver")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl<P: PwmChannel> ServoDriver<P> {
    /// Driver with the default 50 Hz / 13-bit / 500-2500µs setup
    pub fn new(pwm: P) -> ActuatorResult<Self> {
        Self::with_config(pwm, ServoConfig::default())
    }

    pub fn with_config(pwm: P, config: ServoConfig) -> ActuatorResult<Self> {
        config.validate()?;
        Ok(Self {
            pwm,
            config,
            state: ServoState::new(),
            motion: None,
        })
    }

    /// Sets up timer and channel. Allowed exactly once.
    pub fn configure(&mut self) -> ActuatorResult<()> {
        if self.state.status != ActuatorStatus::Uninitialized {
            return Err(ActuatorError::InvalidState("servo already configured".into()));
        }
        let timer = self.config.timer_config();
        self.pwm.configure(&timer)?;
        self.state.status = ActuatorStatus::Ready;
        info!(
            gpio = timer.gpio,
            frequency_hz = timer.frequency_hz,
            resolution_bits = timer.resolution_bits,
            "servo PWM configured"
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.state.status != ActuatorStatus::Uninitialized
    }

    /// Clamps and applies an angle, cancelling any smooth move in progress
    pub fn set_angle(&mut self, degrees: i32) -> ActuatorResult<Angle> {
        self.ensure_configured()?;
        self.cancel_motion();
        let angle = Angle::clamped(degrees);
        self.apply(angle)?;
        Ok(angle)
    }

    pub fn current_angle(&self) -> Angle {
        self.state.current_angle
    }

    pub fn duty_for(&self, angle: Angle) -> u32 {
        self.config.duty_for(angle)
    }

    /// Starts a smooth move from the current angle; returns its id.
    /// Progress happens only through [`tick_motion`](Self::tick_motion).
    pub fn start_smooth_move(&mut self, target: i32, step_delay: Duration) -> ActuatorResult<u64> {
        self.ensure_configured()?;
        let id = self.bump_generation();
        let motion = SmoothMove::new(self.state.current_angle, Angle::clamped(target), step_delay);
        debug!(
            from = self.state.current_angle.degrees(),
            to = motion.target().degrees(),
            steps = motion.remaining_steps(),
            "smooth move started"
        );
        self.motion = Some((id, motion));
        self.state.status = ActuatorStatus::Busy;
        Ok(id)
    }

    /// Advances the smooth move `id` if it is still the active one
    pub fn tick_motion(&mut self, id: u64, now: Instant) -> ActuatorResult<MotionPoll> {
        let motion = match self.motion.as_mut() {
            Some((active, motion)) if *active == id => motion,
            _ => return Ok(MotionPoll::Superseded),
        };

        if let Some(angle) = motion.poll(now) {
            let finished = motion.is_finished();
            self.apply_step(angle, finished)?;
            if finished {
                return Ok(MotionPoll::Done(angle));
            }
        }

        let deadline = self
            .motion
            .as_ref()
            .and_then(|(_, m)| m.next_deadline())
            .unwrap_or(now);
        Ok(MotionPoll::Pending(deadline))
    }

    /// Whether a smooth move is in progress
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    pub fn state(&self) -> &ServoState {
        &self.state
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    /// Erases the channel type so drivers can be shared behind one handle
    pub fn into_boxed(self) -> ServoDriver<Box<dyn PwmChannel>>
    where
        P: 'static,
    {
        ServoDriver {
            pwm: Box::new(self.pwm),
            config: self.config,
            state: self.state,
            motion: self.motion,
        }
    }

    fn ensure_configured(&self) -> ActuatorResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ActuatorError::NotInitialized)
        }
    }

    fn bump_generation(&mut self) -> u64 {
        self.state.generation = self.state.generation.wrapping_add(1);
        self.state.generation
    }

    fn cancel_motion(&mut self) {
        self.bump_generation();
        if let Some((_, motion)) = self.motion.take() {
            debug!(target = motion.target().degrees(), "smooth move preempted");
        }
    }

    fn apply_step(&mut self, angle: Angle, finished: bool) -> ActuatorResult<()> {
        if let Err(err) = self.apply(angle) {
            self.motion = None;
            return Err(err);
        }
        if finished {
            self.motion = None;
            self.state.status = ActuatorStatus::Ready;
        } else {
            self.state.status = ActuatorStatus::Busy;
        }
        Ok(())
    }

    /// Writes the duty for `angle`; the angle is recorded only if the write
    /// succeeded
    fn apply(&mut self, angle: Angle) -> ActuatorResult<()> {
        let duty = self.config.duty_for(angle);
        if let Err(err) = self.pwm.set_duty(duty) {
            warn!(angle = angle.degrees(), duty, error = %err, "duty write failed");
            self.state.status = ActuatorStatus::Fault;
            return Err(err.into());
        }
        self.state.current_angle = angle;
        self.state.last_duty = Some(duty);
        self.state.moves += 1;
        if self.motion.is_none() {
            self.state.status = ActuatorStatus::Ready;
        }
        debug!(angle = angle.degrees(), duty, "servo angle applied");
        Ok(())
    }
}

impl<P: PwmChannel> Actuator for ServoDriver<P> {
    type Command = Angle;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn send(&mut self, cmd: Angle) -> ActuatorResult<()> {
        self.set_angle(cmd.degrees()).map(|_| ())
    }

    fn status(&self) -> ActuatorStatus {
        self.state.status
    }

    /// Drops the duty to 0 so the servo stops holding its position
    fn emergency_stop(&mut self) -> ActuatorResult<()> {
        self.ensure_configured()?;
        self.cancel_motion();
        if let Err(err) = self.pwm.set_duty(0) {
            warn!(error = %err, "releasing servo output failed");
            self.state.status = ActuatorStatus::Fault;
            return Err(err.into());
        }
        self.state.status = ActuatorStatus::Off;
        info!("servo output released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pwm::SimulatedLedc;

    fn configured() -> ServoDriver<SimulatedLedc> {
        let mut servo = ServoDriver::new(SimulatedLedc::new()).unwrap();
        servo.configure().unwrap();
        servo
    }

    #[test]
    fn test_config_default_duty_bounds() {
        let cfg = ServoConfig::default();
        assert_eq!(cfg.duty_for(Angle::MIN), 204);
        assert_eq!(cfg.duty_for(Angle::CENTER), 614);
        assert_eq!(cfg.duty_for(Angle::MAX), 1023);
    }

    #[test]
    fn test_config_pulse_width() {
        let cfg = ServoConfig::default();
        assert_eq!(cfg.pulse_width_us(Angle::MIN), 500);
        assert_eq!(cfg.pulse_width_us(Angle::CENTER), 1500);
        assert_eq!(cfg.pulse_width_us(Angle::MAX), 2500);
    }

    #[test]
    fn test_config_invalid() {
        let cfg = ServoConfig {
            min_pulse_us: 2500,
            max_pulse_us: 500,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ActuatorError::InvalidConfig(_))));

        let cfg = ServoConfig {
            max_pulse_us: 25_000,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ServoConfig {
            frequency_hz: 0,
            ..Default::default()
        };
        assert!(ServoDriver::with_config(SimulatedLedc::new(), cfg).is_err());
    }

    #[test]
    fn test_set_angle_before_configure() {
        let mut servo = ServoDriver::new(SimulatedLedc::new()).unwrap();
        assert_eq!(servo.set_angle(90), Err(ActuatorError::NotInitialized));
        assert_eq!(servo.status(), ActuatorStatus::Uninitialized);
    }

    #[test]
    fn test_configure_twice() {
        let mut servo = configured();
        assert!(matches!(servo.configure(), Err(ActuatorError::InvalidState(_))));
    }

    #[test]
    fn test_set_angle_writes_duty() {
        let mut servo = configured();
        let probe = servo.pwm().probe();

        assert_eq!(servo.set_angle(90).unwrap(), Angle::CENTER);
        assert_eq!(probe.duty(), 614);
        assert_eq!(servo.current_angle(), Angle::CENTER);
        assert_eq!(servo.state().last_duty, Some(614));
        assert_eq!(servo.state().moves, 1);
    }

    #[test]
    fn test_initial_angle_is_zero() {
        let servo = configured();
        assert_eq!(servo.current_angle().degrees(), 0);
        assert_eq!(servo.status(), ActuatorStatus::Ready);
    }

    #[test]
    fn test_start_and_tick() {
        let mut servo = configured();
        let id = servo.start_smooth_move(3, Duration::ZERO).unwrap();
        assert_eq!(servo.status(), ActuatorStatus::Busy);
        assert!(servo.is_moving());

        let now = Instant::now();
        let mut applied = Vec::new();
        loop {
            match servo.tick_motion(id, now).unwrap() {
                MotionPoll::Pending(_) => applied.push(servo.current_angle().degrees()),
                MotionPoll::Done(angle) => {
                    applied.push(angle.degrees());
                    break;
                }
                MotionPoll::Superseded => panic!("motion lost"),
            }
        }
        assert_eq!(applied, vec![0, 1, 2, 3]);
        assert!(!servo.is_moving());
        assert_eq!(servo.status(), ActuatorStatus::Ready);
    }

    #[test]
    fn test_tick_without_motion() {
        let mut servo = configured();
        assert_eq!(servo.tick_motion(1, Instant::now()).unwrap(), MotionPoll::Superseded);
        assert_eq!(servo.state().moves, 0);
    }

    #[test]
    fn test_set_angle_supersedes_motion() {
        let mut servo = configured();
        let id = servo.start_smooth_move(180, Duration::from_secs(1)).unwrap();
        let now = Instant::now();
        assert!(matches!(servo.tick_motion(id, now).unwrap(), MotionPoll::Pending(_)));

        servo.set_angle(45).unwrap();
        assert_eq!(servo.tick_motion(id, now).unwrap(), MotionPoll::Superseded);
        assert_eq!(servo.current_angle().degrees(), 45);
        assert_eq!(servo.status(), ActuatorStatus::Ready);
    }

    #[test]
    fn test_emergency_stop() {
        let mut servo = configured();
        let probe = servo.pwm().probe();
        servo.set_angle(120).unwrap();

        servo.emergency_stop().unwrap();
        assert_eq!(servo.status(), ActuatorStatus::Off);
        assert_eq!(probe.duty(), 0);

        servo.set_angle(60).unwrap();
        assert_eq!(servo.status(), ActuatorStatus::Ready);
    }

    #[test]
    fn test_actuator_name() {
        let cfg = ServoConfig {
            name: "pan".into(),
            ..Default::default()
        };
        let servo = ServoDriver::with_config(SimulatedLedc::new(), cfg).unwrap();
        assert_eq!(servo.name(), "pan");
    }
}
