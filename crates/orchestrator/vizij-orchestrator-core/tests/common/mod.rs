#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use vizij_animation_core::Clip;
use vizij_rig_core::{
    ModelData, PhysicsEngine, PhysicsFactory, PhysicsParams, Skeleton, SkinnedMesh,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Deserialize)]
struct Rig {
    skeleton: Skeleton,
    model: ModelData,
}

pub fn rig(name: &str, fixture: &str) -> SkinnedMesh {
    let rig: Rig = vizij_test_fixtures::models::load(fixture).expect("rig fixture");
    SkinnedMesh::new(name, rig.skeleton, rig.model).expect("valid rig")
}

pub fn leg(name: &str) -> SkinnedMesh {
    rig(name, "leg-rig")
}

pub fn clip(name: &str) -> Clip {
    vizij_test_fixtures::clips::load(name).expect("clip fixture")
}

pub fn approx(a: f32, b: f32) {
    assert!((a - b).abs() <= 1e-5, "left={a} right={b}");
}

/// Call log shared by every engine a [`RecordingFactory`] creates.
#[derive(Clone, Default)]
pub struct PhysicsLog(Arc<Mutex<Vec<String>>>);

impl PhysicsLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub log: PhysicsLog,
}

impl PhysicsFactory for RecordingFactory {
    fn create(&self, mesh: &SkinnedMesh, params: &PhysicsParams) -> Box<dyn PhysicsEngine> {
        self.log
            .push(format!("{}:create({})", mesh.name, mesh.model.rigid_bodies.len()));
        Box::new(RecordingEngine {
            name: mesh.name.clone(),
            log: self.log.clone(),
            gravity_y: params.gravity.y,
        })
    }
}

/// Logs every call; `update` and `warmup` are logged as single entries so the
/// per-mesh path is distinguishable from the shared-world trio.
pub struct RecordingEngine {
    name: String,
    log: PhysicsLog,
    pub gravity_y: f32,
}

impl PhysicsEngine for RecordingEngine {
    fn reset(&mut self, _: &Skeleton) {
        self.log.push(format!("{}:reset", self.name));
    }

    fn push_body_state(&mut self, _: &Skeleton) {
        self.log.push(format!("{}:push", self.name));
    }

    fn step_world(&mut self, delta: f32) {
        self.log.push(format!("{}:step({delta})", self.name));
    }

    fn pull_bone_state(&mut self, _: &mut Skeleton) {
        self.log.push(format!("{}:pull", self.name));
    }

    fn update(&mut self, _: &mut Skeleton, delta: f32) {
        self.log.push(format!("{}:update({delta})", self.name));
    }

    fn warmup(&mut self, _: &mut Skeleton, frames: u32) {
        self.log.push(format!("{}:warmup({frames})", self.name));
    }
}
