//! # ZMP Preview Controller Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::{Isometry3, Vector3};
use std::sync::Arc;
use walk_lib::{
    footstep::{plan_from_path, straight_path, PlanarPose, StepParams},
    ideal::IdealTask,
    task_if::PointSample,
    zmp_ctrl::{CartTable, PreviewGains, ZmpCtrlParams, ZmpPreviewController},
    zmp_ref::build_zmp_reference,
};

fn zmp_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a reference for a 2 m walk ----

    let step_params = StepParams::default();
    let timing = step_params.timing(0.01).unwrap();

    let path = straight_path(
        nalgebra::Vector2::new(0.0, 0.0),
        nalgebra::Vector2::new(2.0, 0.0),
        None,
        0.01,
    )
    .unwrap();
    let plan = plan_from_path(
        &path,
        &step_params,
        PlanarPose::new(0.0, 0.05, 0.0),
        PlanarPose::new(0.0, -0.05, 0.0),
    )
    .unwrap();
    let reference = build_zmp_reference(&plan, &timing).unwrap();

    let params = ZmpCtrlParams::default();
    let model = CartTable::new(0.01, 0.8, params.gravity_mss).unwrap();

    // Bench the gain computation, done for every request
    c.bench_function("PreviewGains::compute", |b| {
        b.iter(|| PreviewGains::compute(&model, &params).unwrap())
    });

    // Bench a full walk of the control law
    c.bench_function("ZmpPreviewController::update", |b| {
        b.iter(|| {
            let task = Arc::new(IdealTask::<PointSample>::detached("bench.com"));
            let mut ctrl = ZmpPreviewController::new(
                task,
                Vector3::new(0.0, 0.0, 0.8),
                reference.clone(),
                &params,
                0.01,
                Isometry3::identity(),
            )
            .unwrap();

            for tick in 0..reference.len() as u64 {
                ctrl.update(tick);
            }
        })
    });
}

criterion_group!(benches, zmp_ctrl_benchmark);
criterion_main!(benches);
