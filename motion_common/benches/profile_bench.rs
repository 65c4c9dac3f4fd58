//! Profile calculator benchmarks.
//!
//! Profiles are resolved on every move issue; the calculation must stay far
//! below one controller cycle.

use criterion::{Criterion, criterion_group, criterion_main};
use motion_common::channel::{Channel, IoLayout};
use motion_common::profile::{MotionProfile, jerk_from_ratio};
use std::hint::black_box;

fn bench_resolve_s_curve(c: &mut Criterion) {
    let profile = MotionProfile::s_curve(250.0, 1200.0, 900.0, 0.4, 0.6);
    c.bench_function("resolve_s_curve", |b| {
        b.iter(|| black_box(profile).resolve().unwrap());
    });
}

fn bench_resolve_jog(c: &mut Criterion) {
    let profile = MotionProfile::jog(-80.0, 400.0, 400.0, 0.5, 0.5);
    c.bench_function("resolve_jog", |b| {
        b.iter(|| black_box(profile).resolve().unwrap());
    });
}

fn bench_jerk_from_ratio(c: &mut Criterion) {
    c.bench_function("jerk_from_ratio", |b| {
        b.iter(|| jerk_from_ratio(black_box(100.0), black_box(500.0), black_box(0.5)).unwrap());
    });
}

fn bench_io_address(c: &mut Criterion) {
    let layout = IoLayout::Word { bits_per_slot: 16 };
    c.bench_function("io_address_word", |b| {
        b.iter(|| layout.address(black_box(Channel::new(1023))));
    });
}

criterion_group!(
    benches,
    bench_resolve_s_curve,
    bench_resolve_jog,
    bench_jerk_from_ratio,
    bench_io_address
);
criterion_main!(benches);
