//! Integration tests for servo-actuator

use crate::*;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn servo() -> (ServoHandle, LedcProbe) {
    let ledc = SimulatedLedc::new();
    let probe = ledc.probe();
    let handle = ServoHandle::new(ServoDriver::new(ledc).unwrap());
    handle.configure().unwrap();
    (handle, probe)
}

/// Duty value -> angle, for reading back the history of a move
fn angle_of(duty: u32) -> i32 {
    let cfg = ServoConfig::default();
    (0..=180)
        .find(|a| cfg.duty_for(Angle::clamped(*a)) == duty)
        .expect("duty does not belong to any angle")
}

/// Channel whose writes start failing on demand
#[derive(Clone, Default)]
struct FlakyPwm {
    fail: Arc<Mutex<bool>>,
    inner: SimulatedLedc,
}

impl PwmChannel for FlakyPwm {
    fn configure(&mut self, config: &PwmTimerConfig) -> Result<(), PwmError> {
        self.inner.configure(config)
    }

    fn set_duty(&mut self, duty: u32) -> Result<(), PwmError> {
        if *self.fail.lock().unwrap() {
            return Err(PwmError::WriteFailed("channel stuck".into()));
        }
        self.inner.set_duty(duty)
    }

    fn max_duty(&self) -> u32 {
        self.inner.max_duty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ANGLE / DUTY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_valid_angle_is_reported_back() {
    let (servo, _) = servo();
    for a in 0..=180 {
        servo.set_angle(a).unwrap();
        assert_eq!(servo.current_angle().unwrap().degrees(), a);
    }
}

#[test]
fn test_out_of_range_is_clamped() {
    let (servo, probe) = servo();

    servo.set_angle(-45).unwrap();
    assert_eq!(servo.current_angle().unwrap(), Angle::MIN);
    assert_eq!(probe.duty(), 204);

    servo.set_angle(1000).unwrap();
    assert_eq!(servo.current_angle().unwrap(), Angle::MAX);
    assert_eq!(probe.duty(), 1023);

    servo.set_angle(i32::MIN).unwrap();
    assert_eq!(servo.current_angle().unwrap(), Angle::MIN);
}

#[test]
fn test_duty_is_monotonic() {
    let cfg = ServoConfig::default();
    let duties: Vec<u32> = (0..=180).map(|a| cfg.duty_for(Angle::clamped(a))).collect();
    assert!(duties.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_boundary_mapping() {
    let cfg = ServoConfig::default();
    assert_eq!(cfg.duty_for(Angle::MIN), 500 * 8191 / 20_000);
    assert_eq!(cfg.duty_for(Angle::MAX), 2500 * 8191 / 20_000);
}

#[test]
fn test_set_angle_is_idempotent() {
    let (servo, probe) = servo();
    servo.set_angle(33).unwrap();
    let first = (probe.duty(), servo.current_angle().unwrap());
    servo.set_angle(33).unwrap();
    let second = (probe.duty(), servo.current_angle().unwrap());
    assert_eq!(first, second);
    assert_eq!(probe.history(), vec![first.0, first.0]);
}

#[test]
fn test_custom_pulse_range() {
    let cfg = ServoConfig {
        min_pulse_us: 1000,
        max_pulse_us: 2000,
        ..Default::default()
    };
    let ledc = SimulatedLedc::new();
    let probe = ledc.probe();
    let mut driver = ServoDriver::with_config(ledc, cfg).unwrap();
    driver.configure().unwrap();

    driver.set_angle(0).unwrap();
    assert_eq!(probe.duty(), 1000 * 8191 / 20_000);
    driver.set_angle(180).unwrap();
    assert_eq!(probe.duty(), 2000 * 8191 / 20_000);
}

// ═══════════════════════════════════════════════════════════════════════════
// SMOOTH MOVE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_smooth_move_ends_on_clamped_target() {
    let (servo, _) = servo();

    servo.set_angle(170).unwrap();
    let outcome = servo.smooth_move_to(250, 0).unwrap();
    assert_eq!(outcome, MoveOutcome::Completed(Angle::MAX));
    assert_eq!(servo.current_angle().unwrap(), Angle::MAX);

    servo.smooth_move_to(-20, 0).unwrap();
    assert_eq!(servo.current_angle().unwrap(), Angle::MIN);
}

#[test]
fn test_smooth_move_visits_each_angle_once_upwards() {
    let (servo, probe) = servo();
    servo.set_angle(20).unwrap();
    let before = probe.updates();

    servo.smooth_move_to(30, 0).unwrap();

    let visited: Vec<i32> = probe.history_since(before).iter().map(|d| angle_of(*d)).collect();
    assert_eq!(visited, (20..=30).collect::<Vec<_>>());
}

#[test]
fn test_smooth_move_visits_each_angle_once_downwards() {
    let (servo, probe) = servo();
    servo.set_angle(100).unwrap();
    let before = probe.updates();

    servo.smooth_move_to(95, 0).unwrap();

    let visited: Vec<i32> = probe.history_since(before).iter().map(|d| angle_of(*d)).collect();
    assert_eq!(visited, vec![100, 99, 98, 97, 96, 95]);
}

#[test]
fn test_smooth_move_takes_step_delay_per_degree() {
    let (servo, _) = servo();
    let start = std::time::Instant::now();
    servo.smooth_move_to(10, 5).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_smooth_move_preempted_from_another_thread() {
    let (servo, _) = servo();
    let mover = servo.clone();

    let worker = thread::spawn(move || mover.smooth_move_to(180, 10));
    thread::sleep(Duration::from_millis(60));
    servo.set_angle(10).unwrap();

    let outcome = worker.join().unwrap().unwrap();
    assert_eq!(outcome, MoveOutcome::Preempted { at: Angle::clamped(10) });
    assert_eq!(servo.current_angle().unwrap().degrees(), 10);
    assert_eq!(servo.status().unwrap(), ActuatorStatus::Ready);
}

#[test]
fn test_newer_smooth_move_preempts_older() {
    let (servo, _) = servo();
    let mover = servo.clone();

    let first = thread::spawn(move || mover.smooth_move_to(180, 10));
    thread::sleep(Duration::from_millis(40));
    let second = servo.smooth_move_to(0, 0).unwrap();

    assert_eq!(second, MoveOutcome::Completed(Angle::MIN));
    assert!(!first.join().unwrap().unwrap().is_completed());
    assert_eq!(servo.current_angle().unwrap(), Angle::MIN);
}

// ═══════════════════════════════════════════════════════════════════════════
// FAULTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_write_failure_is_reported_and_angle_kept() {
    let pwm = FlakyPwm::default();
    let fail = Arc::clone(&pwm.fail);
    let servo = ServoHandle::new(ServoDriver::new(pwm).unwrap());
    servo.configure().unwrap();
    servo.set_angle(40).unwrap();

    *fail.lock().unwrap() = true;
    let err = servo.set_angle(120).unwrap_err();
    assert!(err.is_fault());
    assert_eq!(servo.current_angle().unwrap().degrees(), 40);
    assert_eq!(servo.status().unwrap(), ActuatorStatus::Fault);

    *fail.lock().unwrap() = false;
    servo.set_angle(120).unwrap();
    assert_eq!(servo.status().unwrap(), ActuatorStatus::Ready);
}

#[test]
fn test_write_failure_aborts_smooth_move() {
    let pwm = FlakyPwm::default();
    let fail = Arc::clone(&pwm.fail);
    let servo = ServoHandle::new(ServoDriver::new(pwm).unwrap());
    servo.configure().unwrap();

    *fail.lock().unwrap() = true;
    assert!(servo.smooth_move_to(90, 0).unwrap_err().is_fault());
    assert_eq!(servo.current_angle().unwrap(), Angle::MIN);
    assert!(!servo.with_driver(|d| d.is_moving()).unwrap());
}

#[test]
fn test_failed_release_reports_fault() {
    let pwm = FlakyPwm::default();
    let fail = Arc::clone(&pwm.fail);
    let servo = ServoHandle::new(ServoDriver::new(pwm).unwrap());
    servo.configure().unwrap();
    servo.set_angle(75).unwrap();

    *fail.lock().unwrap() = true;
    assert!(servo.emergency_stop().unwrap_err().is_fault());
    assert_eq!(servo.status().unwrap(), ActuatorStatus::Fault);

    *fail.lock().unwrap() = false;
    servo.emergency_stop().unwrap();
    assert_eq!(servo.status().unwrap(), ActuatorStatus::Off);
}

#[test]
fn test_configuration_failure() {
    let cfg = ServoConfig {
        frequency_hz: 20_000,
        max_pulse_us: 40,
        min_pulse_us: 10,
        ..Default::default()
    };
    let mut driver = ServoDriver::with_config(SimulatedLedc::new(), cfg).unwrap();
    let err = driver.configure().unwrap_err();
    assert!(matches!(err, ActuatorError::Fault(PwmError::FrequencyOutOfReach { .. })));
    assert!(!driver.is_configured());
}

#[test]
fn test_state_serializes() {
    let (servo, _) = servo();
    servo.set_angle(12).unwrap();
    let json = serde_json::to_value(servo.state().unwrap()).unwrap();
    assert_eq!(json["current_angle"], 12);
    assert_eq!(json["status"], "Ready");
}
