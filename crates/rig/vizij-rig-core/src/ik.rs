//! IK seam and the reference cyclic-coordinate-descent solver.

use glam::{EulerRot, Quat, Vec3};

use crate::mesh::SkinnedMesh;
use crate::model::IkChain;
use crate::skeleton::Skeleton;

const MIN_STEP_ANGLE: f32 = 1e-5;

/// Solves IK chains against a skeleton. World matrices are expected to be
/// current on entry and are kept current for every bone the solver touches.
pub trait IkSolver: Send {
    fn solve_chain(&mut self, skeleton: &mut Skeleton, chain: &IkChain);

    fn solve_all(&mut self, skeleton: &mut Skeleton, chains: &[IkChain]) {
        for chain in chains {
            self.solve_chain(skeleton, chain);
        }
    }
}

/// Builds the IK solver for a mesh at registration time.
pub trait IkSolverFactory: Send {
    fn create(&self, mesh: &SkinnedMesh) -> Box<dyn IkSolver>;
}

/// CCD: each link in turn rotates so the effector points at the goal, repeated
/// for the chain's iteration count or until no link moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct CcdIkSolver;

impl IkSolver for CcdIkSolver {
    fn solve_chain(&mut self, skeleton: &mut Skeleton, chain: &IkChain) {
        let Some(goal) = skeleton.world_position(chain.target) else {
            return;
        };
        for _ in 0..chain.iteration {
            let mut rotated = false;
            for link in &chain.links {
                if !link.enabled {
                    break;
                }
                let (Some(link_world), Some(effector)) = (
                    skeleton.world_matrix(link.index),
                    skeleton.world_position(chain.effector),
                ) else {
                    break;
                };
                let (_, link_rot, link_pos) = link_world.to_scale_rotation_translation();
                let inv = link_rot.inverse();
                let effector_vec = (inv * (effector - link_pos)).normalize_or_zero();
                let goal_vec = (inv * (goal - link_pos)).normalize_or_zero();

                let mut angle = goal_vec.dot(effector_vec).clamp(-1.0, 1.0).acos();
                if angle < MIN_STEP_ANGLE {
                    continue;
                }
                if let Some(min) = chain.min_angle {
                    angle = angle.max(min);
                }
                if let Some(max) = chain.max_angle {
                    angle = angle.min(max);
                }
                let axis = effector_vec.cross(goal_vec).normalize_or_zero();
                if axis == Vec3::ZERO {
                    continue;
                }

                let Some(bone) = skeleton.bone_mut(link.index) else {
                    break;
                };
                let mut q = bone.rotation * Quat::from_axis_angle(axis, angle);
                if let Some(limit) = link.limitation {
                    let c = q.w.min(1.0);
                    let c2 = (1.0 - c * c).sqrt();
                    q = Quat::from_xyzw(limit.x * c2, limit.y * c2, limit.z * c2, c);
                }
                if link.rotation_min.is_some() || link.rotation_max.is_some() {
                    let (x, y, z) = q.to_euler(EulerRot::XYZ);
                    let mut euler = Vec3::new(x, y, z);
                    if let Some(min) = link.rotation_min {
                        euler = euler.max(min);
                    }
                    if let Some(max) = link.rotation_max {
                        euler = euler.min(max);
                    }
                    q = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
                }
                bone.rotation = q.normalize();
                skeleton.update_world_from(link.index);
                rotated = true;
            }
            if !rotated {
                break;
            }
        }
    }
}

/// Factory installed by default: one [`CcdIkSolver`] per mesh.
#[derive(Clone, Copy, Debug, Default)]
pub struct CcdIkFactory;

impl IkSolverFactory for CcdIkFactory {
    fn create(&self, mesh: &SkinnedMesh) -> Box<dyn IkSolver> {
        log::debug!(
            "ccd ik for '{}': {} chains",
            mesh.name,
            mesh.model.iks.len()
        );
        Box::new(CcdIkSolver)
    }
}
