//! Skinned mesh: a skeleton plus its rig descriptors.

use glam::Quat;
use uuid::Uuid;
use vizij_animation_core::{AnimationTarget, TargetHandle, TrackTarget, Value};

use crate::error::RigError;
use crate::model::ModelData;
use crate::skeleton::Skeleton;

const CHANNEL_POSITION: u32 = 0;
const CHANNEL_ROTATION: u32 = 1;

/// A character the pipeline animates. Clones share the id, so identity
/// survives moving the mesh in and out of a helper.
#[derive(Clone, Debug)]
pub struct SkinnedMesh {
    id: Uuid,
    pub name: String,
    pub skeleton: Skeleton,
    pub model: ModelData,
}

impl SkinnedMesh {
    pub fn new(
        name: impl Into<String>,
        skeleton: Skeleton,
        model: ModelData,
    ) -> Result<Self, RigError> {
        model.validate(skeleton.len())?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            skeleton,
            model,
        })
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn split(handle: TargetHandle) -> (usize, u32) {
        ((handle.0 / 2) as usize, handle.0 % 2)
    }
}

impl AnimationTarget for SkinnedMesh {
    fn resolve(&self, target: &TrackTarget) -> Option<TargetHandle> {
        let (bone, channel) = match target {
            TrackTarget::BonePosition { bone } => (bone, CHANNEL_POSITION),
            TrackTarget::BoneRotation { bone } => (bone, CHANNEL_ROTATION),
            _ => return None,
        };
        let index = u32::try_from(self.skeleton.find(bone)?).ok()?;
        Some(TargetHandle(index * 2 + channel))
    }

    fn read(&self, handle: TargetHandle) -> Option<Value> {
        let (index, channel) = Self::split(handle);
        let bone = self.skeleton.bone(index)?;
        Some(if channel == CHANNEL_POSITION {
            Value::Vec3(bone.position)
        } else {
            Value::Quat(bone.rotation)
        })
    }

    fn write(&mut self, handle: TargetHandle, value: Value) {
        let (index, channel) = Self::split(handle);
        let Some(bone) = self.skeleton.bone_mut(index) else {
            return;
        };
        match (channel, value) {
            (CHANNEL_POSITION, Value::Vec3(v)) => bone.position = v,
            (CHANNEL_ROTATION, Value::Quat(q)) => bone.rotation = q.normalize(),
            (_, other) => log::trace!(
                "mesh '{}': ignoring {:?} for bone {} channel {}",
                self.name,
                other.kind(),
                index,
                channel
            ),
        }
    }
}

/// Rotation of `bone`, or identity when out of range.
pub(crate) fn bone_rotation(skeleton: &Skeleton, bone: usize) -> Quat {
    skeleton
        .bone(bone)
        .map(|b| b.rotation)
        .unwrap_or(Quat::IDENTITY)
}
