//! Per-mesh pose snapshot taken right after sampling.

use glam::{Quat, Vec3};

use crate::skeleton::Skeleton;

/// Floats per bone: position xyz, rotation xyzw.
pub const POSE_STRIDE: usize = 7;

/// Flat buffer of bone local transforms, sized on first save.
#[derive(Clone, Debug, Default)]
pub struct PoseBackup {
    data: Vec<f32>,
}

impl PoseBackup {
    /// Backup holding the skeleton's current pose.
    pub fn capture(skeleton: &Skeleton) -> Self {
        let mut backup = Self::default();
        backup.save(skeleton);
        backup
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bone_count(&self) -> usize {
        self.data.len() / POSE_STRIDE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn save(&mut self, skeleton: &Skeleton) {
        self.data.resize(skeleton.len() * POSE_STRIDE, 0.0);
        for (record, bone) in self.data.chunks_exact_mut(POSE_STRIDE).zip(skeleton.bones()) {
            record[..3].copy_from_slice(&bone.position.to_array());
            record[3..].copy_from_slice(&bone.rotation.to_array());
        }
    }

    /// Write the snapshot back onto the bones; no-op before the first save.
    pub fn restore(&self, skeleton: &mut Skeleton) {
        for (i, record) in self.data.chunks_exact(POSE_STRIDE).enumerate() {
            let Some(bone) = skeleton.bone_mut(i) else {
                break;
            };
            bone.position = Vec3::from_slice(&record[..3]);
            bone.rotation = Quat::from_slice(&record[3..]);
        }
    }
}
