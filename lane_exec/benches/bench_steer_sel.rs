//! # Steering Selection Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::s;

use lane_lib::{
    lane_ctrl::Params,
    raster::LaneMask,
    steer_sel,
    traj_bank::TrajBank,
};

fn steer_sel_benchmark(c: &mut Criterion) {
    let params = Params::default();

    // Bench building the whole bank, done once before the first cycle
    c.bench_function("TrajBank::new", |b| {
        b.iter(|| TrajBank::new(&params.raster, &params.vehicle, &params.traj_bank).unwrap())
    });

    let bank = TrajBank::new(&params.raster, &params.vehicle, &params.traj_bank).unwrap();

    // ---- Build dummy lane masks ----

    // A lane bending to the right of the vehicle
    let curved_lane: LaneMask = bank.get(12).unwrap().footprint();

    // A wide lane covering the lower half of the raster
    let mut wide_lane = params.raster.empty_mask();
    wide_lane.slice_mut(s![150.., 100..350]).fill(true);

    // Bench selection, done every cycle
    c.bench_function("steer_sel::select_angle::curved", |b| {
        b.iter(|| steer_sel::select_angle(&curved_lane, &bank))
    });
    c.bench_function("steer_sel::select_angle::wide", |b| {
        b.iter(|| steer_sel::select_angle(&wide_lane, &bank))
    });
}

criterion_group!(benches, steer_sel_benchmark);
criterion_main!(benches);
