//! Benchmarks for one helper frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde::Deserialize;
use vizij_animation_core::Clip;
use vizij_orchestrator::{AnimationHelper, HelperConfig, MeshParams};
use vizij_rig_core::{ModelData, Skeleton, SkinnedMesh};

#[derive(Deserialize)]
struct Rig {
    skeleton: Skeleton,
    model: ModelData,
}

fn helper_with(meshes: usize, config: HelperConfig) -> AnimationHelper {
    let mut helper = AnimationHelper::new(config).unwrap();
    let walk: Clip = vizij_test_fixtures::clips::load("walk").unwrap();
    for i in 0..meshes {
        let rig: Rig = vizij_test_fixtures::models::load("leg-rig").unwrap();
        let mesh = SkinnedMesh::new(format!("mesh{i}"), rig.skeleton, rig.model).unwrap();
        let params = MeshParams {
            animations: vec![walk.clone()],
            physics: None,
        };
        helper.register_mesh(mesh, params).unwrap();
    }
    helper
}

fn bench_advance(c: &mut Criterion) {
    c.bench_function("advance_legacy_10_meshes", |b| {
        let mut helper = helper_with(10, HelperConfig::default());
        b.iter(|| black_box(helper.advance(black_box(1.0 / 60.0))))
    });

    c.bench_function("advance_dependency_order_10_meshes", |b| {
        let config = HelperConfig {
            dependency_order: true,
            ..HelperConfig::default()
        };
        let mut helper = helper_with(10, config);
        b.iter(|| black_box(helper.advance(black_box(1.0 / 60.0))))
    });
}

fn bench_registration(c: &mut Criterion) {
    // Every registration re-syncs the timeline.
    c.bench_function("register_50_meshes", |b| {
        b.iter(|| black_box(helper_with(50, HelperConfig::default())))
    });
}

criterion_group!(benches, bench_advance, bench_registration);
criterion_main!(benches);
