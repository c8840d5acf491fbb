//! # Console Benchmarks
//!
//! Measures line splitting and command dispatch.
//!
//! Run: `cargo bench --bench console_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use servo_actuator::{ServoDriver, ServoHandle, SimulatedLedc};
use servo_console::{split_argv, Console};

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_argv");

    group.bench_function("plain", |b| {
        b.iter(|| black_box(split_argv(black_box("servo_smooth 120 15")).unwrap()))
    });

    group.bench_function("quoted", |b| {
        b.iter(|| black_box(split_argv(black_box("servo \"90\" \\ x")).unwrap()))
    });

    group.finish();
}

fn bench_process_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_line");

    let servo = ServoHandle::new(ServoDriver::new(SimulatedLedc::new()).unwrap());
    servo.configure().unwrap();
    let mut console = Console::new(servo);

    group.bench_function("servo", |b| {
        b.iter(|| black_box(console.process_line("servo 90")))
    });

    group.bench_function("unrecognized", |b| {
        b.iter(|| black_box(console.process_line("reboot")))
    });

    group.finish();
}

criterion_group!(benches, bench_split, bench_process_line);
criterion_main!(benches);
