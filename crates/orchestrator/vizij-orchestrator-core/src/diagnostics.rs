use serde::{Deserialize, Serialize};

use crate::objects::ObjectId;

/// Notable transitions observed during one `advance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameEvent {
    /// A bone-affecting clip wrapped around.
    MeshLooped { mesh: ObjectId, clip: String },
    PhysicsReset { mesh: ObjectId },
    AudioStarted { audio: ObjectId },
    AudioStopped { audio: ObjectId },
}

/// Report returned by [`AnimationHelper::advance`](crate::AnimationHelper::advance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub epoch: u64,
    pub delta: f32,
    /// In pipeline order: audio, then meshes in registration order.
    pub events: Vec<FrameEvent>,
}

impl Frame {
    pub fn looped_meshes(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.events.iter().filter_map(|e| match e {
            FrameEvent::MeshLooped { mesh, .. } => Some(*mesh),
            _ => None,
        })
    }
}
