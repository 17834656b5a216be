//! Bone hierarchy with local transforms and cached world matrices.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// One bone's local transform relative to its parent. Name and parent are
/// fixed once the bone is built; only the local transform is writable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bone {
    name: String,
    #[serde(default)]
    parent: Option<usize>,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<usize>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            parent,
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

/// Bones stored parent-first: every parent index is smaller than its child's.
/// That ordering lets world matrices refresh in a single forward sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bone>", into = "Vec<Bone>")]
pub struct Skeleton {
    bones: Vec<Bone>,
    bind_pose: Vec<(Vec3, Quat)>,
    world: Vec<Mat4>,
    names: HashMap<String, usize>,
}

impl TryFrom<Vec<Bone>> for Skeleton {
    type Error = RigError;

    fn try_from(bones: Vec<Bone>) -> Result<Self, Self::Error> {
        Skeleton::new(bones)
    }
}

impl From<Skeleton> for Vec<Bone> {
    fn from(skeleton: Skeleton) -> Self {
        skeleton.bones
    }
}

impl Skeleton {
    /// Build a skeleton; the given local transforms become the bind pose.
    pub fn new(bones: Vec<Bone>) -> Result<Self, RigError> {
        let mut names = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= i {
                    return Err(RigError::ParentOrder {
                        bone: i,
                        name: bone.name.clone(),
                        parent,
                    });
                }
            }
            // First bone wins on duplicate names.
            names.entry(bone.name.clone()).or_insert(i);
        }
        let bind_pose = bones.iter().map(|b| (b.position, b.rotation)).collect();
        let mut skeleton = Self {
            world: vec![Mat4::IDENTITY; bones.len()],
            bones,
            bind_pose,
            names,
        };
        skeleton.update_world_matrices();
        Ok(skeleton)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[inline]
    pub fn bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Restore every bone to its bind pose (world matrices are not refreshed).
    pub fn reset_to_bind_pose(&mut self) {
        for (bone, (position, rotation)) in self.bones.iter_mut().zip(&self.bind_pose) {
            bone.position = *position;
            bone.rotation = *rotation;
        }
    }

    pub fn update_world_matrices(&mut self) {
        self.update_world_from(0);
    }

    /// Recompute world matrices for `index` and every bone after it. Parents
    /// precede children, so this covers the whole subtree rooted at `index`.
    pub fn update_world_from(&mut self, index: usize) {
        for i in index..self.bones.len() {
            let local = self.bones[i].local_matrix();
            self.world[i] = match self.bones[i].parent {
                Some(p) => self.world[p] * local,
                None => local,
            };
        }
    }

    #[inline]
    pub fn world_matrix(&self, index: usize) -> Option<Mat4> {
        self.world.get(index).copied()
    }

    #[inline]
    pub fn world_position(&self, index: usize) -> Option<Vec3> {
        self.world.get(index).map(|m| m.w_axis.truncate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm() -> Skeleton {
        Skeleton::new(vec![
            Bone::new("root", None, Vec3::ZERO),
            Bone::new("upper", Some(0), Vec3::new(0.0, 1.0, 0.0)),
            Bone::new("lower", Some(1), Vec3::new(1.0, 0.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn world_positions_follow_parents() {
        let mut sk = arm();
        assert!((sk.world_position(2).unwrap() - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);

        sk.bone_mut(1).unwrap().rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        sk.update_world_from(1);
        assert!((sk.world_position(2).unwrap() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn rejects_child_before_parent() {
        let err = Skeleton::new(vec![
            Bone::new("a", Some(1), Vec3::ZERO),
            Bone::new("b", None, Vec3::ZERO),
        ])
        .unwrap_err();
        assert!(matches!(err, RigError::ParentOrder { bone: 0, parent: 1, .. }));
    }

    #[test]
    fn bone_mut_edits_transforms_only() {
        let mut sk = arm();
        let bone = sk.bone_mut(2).unwrap();
        bone.position = Vec3::new(2.0, 0.0, 0.0);
        bone.rotation = Quat::from_rotation_y(0.3);
        assert_eq!((bone.name(), bone.parent()), ("lower", Some(1)));
        sk.update_world_matrices();
        assert!((sk.world_position(2).unwrap() - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
        assert_eq!(sk.find("lower"), Some(2));

        // Hierarchy only enters through construction, which checks it.
        let err = serde_json::from_str::<Skeleton>(
            r#"[{"name": "a", "parent": 1}, {"name": "b"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not precede"), "{err}");
    }

    #[test]
    fn bind_pose_reset_and_lookup() {
        let mut sk = arm();
        sk.bone_mut(2).unwrap().position = Vec3::splat(9.0);
        sk.reset_to_bind_pose();
        assert_eq!(sk.bone(2).unwrap().position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(sk.find("lower"), Some(2));
        assert_eq!(sk.find("tail"), None);
    }
}
