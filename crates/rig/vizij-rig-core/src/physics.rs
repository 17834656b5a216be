//! Physics seam. A rigid-body backend implements [`PhysicsEngine`]; none ships here.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::SkinnedMesh;
use crate::skeleton::Skeleton;

/// Step used by [`PhysicsEngine::warmup`].
pub const WARMUP_STEP: f32 = 1.0 / 60.0;

fn default_warmup() -> u32 {
    60
}
fn default_unit_step() -> f32 {
    1.0 / 65.0
}
fn default_max_step_num() -> u32 {
    3
}
fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -98.0, 0.0)
}
fn default_true() -> bool {
    true
}

/// Tuning for a mesh's physics world.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsParams {
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Fixed sub-step size in seconds.
    #[serde(default = "default_unit_step")]
    pub unit_step: f32,
    /// Maximum fixed sub-steps per update.
    #[serde(default = "default_max_step_num")]
    pub max_step_num: u32,
    /// Frames simulated at registration so bodies settle.
    #[serde(default = "default_warmup")]
    pub warmup: u32,
    /// Pose the mesh at its first animation frame before warming up.
    #[serde(default = "default_true")]
    pub animation_warmup: bool,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            unit_step: default_unit_step(),
            max_step_num: default_max_step_num(),
            warmup: default_warmup(),
            animation_warmup: true,
        }
    }
}

/// Rigid-body simulation bound to one mesh's skeleton.
///
/// `update` is the per-mesh step. In shared-world mode the helper instead calls
/// `push_body_state` on every mesh, `step_world` once on the master, then
/// `pull_bone_state` on every mesh.
pub trait PhysicsEngine: Send {
    /// Snap bodies to the current pose and zero their velocities.
    fn reset(&mut self, skeleton: &Skeleton);
    /// Move kinematic bodies to their bones.
    fn push_body_state(&mut self, skeleton: &Skeleton);
    fn step_world(&mut self, delta: f32);
    /// Write simulated body transforms back onto their bones.
    fn pull_bone_state(&mut self, skeleton: &mut Skeleton);

    fn update(&mut self, skeleton: &mut Skeleton, delta: f32) {
        self.push_body_state(skeleton);
        self.step_world(delta);
        self.pull_bone_state(skeleton);
    }

    fn warmup(&mut self, skeleton: &mut Skeleton, frames: u32) {
        for _ in 0..frames {
            self.update(skeleton, WARMUP_STEP);
        }
    }
}

/// Builds the physics engine for a mesh when it registers with physics.
pub trait PhysicsFactory: Send {
    fn create(&self, mesh: &SkinnedMesh, params: &PhysicsParams) -> Box<dyn PhysicsEngine>;
}
