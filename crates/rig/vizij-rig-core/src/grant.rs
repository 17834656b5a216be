//! Grant ("append") solver: a bone inherits a ratio of another bone's rotation.

use glam::Quat;

use crate::mesh::bone_rotation;
use crate::model::{GrantDescriptor, ModelData};
use crate::skeleton::Skeleton;

/// Applies rotation grants in descriptor order.
///
/// Local grants and position grants are accepted but have no effect.
#[derive(Clone, Debug, Default)]
pub struct GrantSolver {
    grants: Vec<GrantDescriptor>,
}

impl GrantSolver {
    pub fn new(grants: Vec<GrantDescriptor>) -> Self {
        Self { grants }
    }

    pub fn for_model(model: &ModelData) -> Self {
        Self::new(model.grants.clone())
    }

    pub fn grants(&self) -> &[GrantDescriptor] {
        &self.grants
    }

    /// Apply every grant in order. Only local rotations change; world matrices
    /// are left for the caller to refresh.
    pub fn solve_all(&self, skeleton: &mut Skeleton) {
        for index in 0..self.grants.len() {
            self.solve_one(skeleton, index);
        }
    }

    /// Apply grant `index` using the source bone's current rotation.
    pub fn solve_one(&self, skeleton: &mut Skeleton, index: usize) {
        let Some(grant) = self.grants.get(index) else {
            return;
        };
        if !grant.is_effective() {
            return;
        }
        let source = bone_rotation(skeleton, grant.source);
        if let Some(bone) = skeleton.bone_mut(grant.target) {
            Self::add_grant_rotation(&mut bone.rotation, source, grant.ratio);
        }
    }

    /// `target = target * slerp(identity, source, ratio)`.
    pub fn add_grant_rotation(target: &mut Quat, source: Quat, ratio: f32) {
        *target = (*target * slerp_from_identity(source, ratio)).normalize();
    }
}

/// Ratio 0 and 1 return identity and `q` exactly, without slerp round-off.
pub(crate) fn slerp_from_identity(q: Quat, t: f32) -> Quat {
    if t == 0.0 {
        Quat::IDENTITY
    } else if t == 1.0 {
        q
    } else {
        Quat::IDENTITY.slerp(q, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;
    use glam::Vec3;

    fn pair(ratio: f32) -> (Skeleton, GrantSolver) {
        let mut sk = Skeleton::new(vec![
            Bone::new("src", None, Vec3::ZERO),
            Bone::new("dst", None, Vec3::X),
        ])
        .unwrap();
        sk.bone_mut(0).unwrap().rotation = Quat::from_rotation_y(1.0);
        sk.bone_mut(1).unwrap().rotation = Quat::from_rotation_x(0.5);
        (sk, GrantSolver::new(vec![GrantDescriptor::rotation(1, 0, ratio)]))
    }

    #[test]
    fn ratio_zero_leaves_target_unchanged() {
        let (mut sk, solver) = pair(0.0);
        solver.solve_all(&mut sk);
        let r = sk.bone(1).unwrap().rotation;
        assert!(r.abs_diff_eq(Quat::from_rotation_x(0.5), 1e-6));
    }

    #[test]
    fn ratio_one_multiplies_full_source() {
        let (mut sk, solver) = pair(1.0);
        solver.solve_all(&mut sk);
        let expected = Quat::from_rotation_x(0.5) * Quat::from_rotation_y(1.0);
        assert!(sk.bone(1).unwrap().rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn half_ratio_applies_half_angle() {
        let (mut sk, solver) = pair(0.5);
        sk.bone_mut(1).unwrap().rotation = Quat::IDENTITY;
        solver.solve_all(&mut sk);
        let expected = Quat::from_rotation_y(0.5);
        assert!(sk.bone(1).unwrap().rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn world_matrices_wait_for_the_caller() {
        let (mut sk, solver) = pair(1.0);
        let before = sk.world_matrix(1).unwrap();
        solver.solve_all(&mut sk);
        assert_eq!(sk.world_matrix(1).unwrap(), before);
        sk.update_world_matrices();
        assert_ne!(sk.world_matrix(1).unwrap(), before);
    }

    #[test]
    fn local_grants_are_ignored() {
        let (mut sk, _) = pair(1.0);
        let mut grant = GrantDescriptor::rotation(1, 0, 1.0);
        grant.is_local = true;
        GrantSolver::new(vec![grant]).solve_all(&mut sk);
        assert!(sk
            .bone(1)
            .unwrap()
            .rotation
            .abs_diff_eq(Quat::from_rotation_x(0.5), 1e-6));
    }
}
