//! # Actuator Benchmarks
//!
//! Measures the angle to duty conversion and the cost of driving a smooth
//! move through the simulated LEDC channel.
//!
//! Run: `cargo bench --bench actuator_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use servo_actuator::{Angle, ServoConfig, ServoDriver, ServoHandle, SimulatedLedc, SmoothMove};
use std::time::{Duration, Instant};

/// Benchmark angle to duty conversion
fn bench_duty(c: &mut Criterion) {
    let mut group = c.benchmark_group("duty");
    let config = ServoConfig::default();

    group.bench_function("duty_for_single", |b| {
        b.iter(|| black_box(config.duty_for(black_box(Angle::CENTER))))
    });

    group.bench_function("duty_for_sweep", |b| {
        b.iter(|| {
            (0..=180)
                .map(|a| config.duty_for(Angle::clamped(a)))
                .fold(0u32, |acc, d| acc.wrapping_add(d))
        })
    });

    group.bench_function("clamp", |b| {
        b.iter(|| black_box(Angle::clamped(black_box(-40))))
    });

    group.finish();
}

/// Benchmark smooth move state machine without sleeping
fn bench_smooth_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth_move");

    for span in [10, 90, 180] {
        group.bench_with_input(BenchmarkId::new("drain", span), &span, |b, &span| {
            b.iter(|| {
                let mut motion = SmoothMove::new(Angle::MIN, Angle::clamped(span), Duration::ZERO);
                let now = Instant::now();
                let mut steps = 0;
                while motion.poll(now).is_some() {
                    steps += 1;
                }
                black_box(steps)
            })
        });
    }

    group.finish();
}

/// Benchmark commands through the shared handle
fn bench_handle(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle");

    let servo = ServoHandle::new(ServoDriver::new(SimulatedLedc::new()).unwrap());
    servo.configure().unwrap();

    group.bench_function("set_angle", |b| {
        let mut angle = 0;
        b.iter(|| {
            angle = (angle + 7) % 181;
            black_box(servo.set_angle(angle).unwrap())
        })
    });

    group.bench_function("smooth_move_full_sweep", |b| {
        b.iter(|| {
            servo.set_angle(0).unwrap();
            black_box(servo.smooth_move_to(180, 0).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_duty, bench_smooth_move, bench_handle);
criterion_main!(benches);
