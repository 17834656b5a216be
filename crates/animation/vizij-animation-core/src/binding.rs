//! Binding of track targets to host slots.
//!
//! Hosts (skinned meshes, cameras) implement [`AnimationTarget`]; each action resolves
//! its tracks once on the first advance and keeps the handles in a [`BindingSet`].

use crate::data::{Clip, TrackTarget};
use crate::value::Value;

/// Opaque slot handle chosen by the target (e.g. bone index + channel).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TargetHandle(pub u32);

/// Something a mixer can animate.
pub trait AnimationTarget {
    /// Map a track target onto a slot; `None` leaves the track unbound.
    fn resolve(&self, target: &TrackTarget) -> Option<TargetHandle>;
    /// Current value of a bound slot.
    fn read(&self, handle: TargetHandle) -> Option<Value>;
    fn write(&mut self, handle: TargetHandle, value: Value);
}

/// Per-action view over resolved handles, one entry per clip track.
#[derive(Clone, Debug, Default)]
pub struct BindingSet {
    handles: Vec<Option<TargetHandle>>,
    bound: bool,
}

impl BindingSet {
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn handles(&self) -> &[Option<TargetHandle>] {
        &self.handles
    }

    /// Resolve every track of `clip` against `target` unless already bound.
    pub fn ensure<T: AnimationTarget + ?Sized>(&mut self, clip: &Clip, target: &T) {
        if self.bound {
            return;
        }
        self.handles.clear();
        self.handles
            .extend(clip.tracks.iter().map(|t| target.resolve(&t.target)));
        let unbound = self.handles.iter().filter(|h| h.is_none()).count();
        if unbound > 0 {
            log::debug!(
                "clip '{}': {} of {} tracks have no matching target",
                clip.name,
                unbound,
                self.handles.len()
            );
        }
        self.bound = true;
    }

    /// Drop cached handles so the next advance resolves again.
    pub fn invalidate(&mut self) {
        self.handles.clear();
        self.bound = false;
    }
}
