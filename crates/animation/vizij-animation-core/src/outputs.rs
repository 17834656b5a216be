//! Events emitted while advancing a mixer.

use serde::{Deserialize, Serialize};

use crate::ids::ActionId;

/// Discrete signals emitted during [`crate::Mixer::advance`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MixerEvent {
    /// The action wrapped around its clip duration `loop_delta` times this tick.
    Loop {
        action: ActionId,
        clip: String,
        loop_delta: i32,
        /// Copied from [`crate::Clip::affects_bones`] so listeners can filter.
        affects_bones: bool,
    },
    /// A `LoopMode::Once` action reached its end.
    Finished { action: ActionId, clip: String },
}

impl MixerEvent {
    pub fn action(&self) -> ActionId {
        match self {
            MixerEvent::Loop { action, .. } | MixerEvent::Finished { action, .. } => *action,
        }
    }

    /// True for a loop event of a clip that drives bones.
    pub fn is_bone_loop(&self) -> bool {
        matches!(
            self,
            MixerEvent::Loop {
                affects_bones: true,
                ..
            }
        )
    }
}
