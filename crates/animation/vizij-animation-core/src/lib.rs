//! Vizij Animation Core (engine-agnostic)
//!
//! Keyframe clips for skinned meshes and cameras, and the [`Mixer`] that plays them.
//! A mixer owns a set of actions (one per played clip), advances their local time,
//! samples every track and blends the weighted results into an [`AnimationTarget`].
//! Loop boundaries are reported synchronously as [`MixerEvent`]s from
//! [`Mixer::advance`].

pub mod accumulate;
pub mod binding;
pub mod data;
pub mod ids;
pub mod interp;
pub mod mixer;
pub mod outputs;
pub mod sampling;
pub mod value;

// Re-exports for consumers (rig + orchestrator)
pub use accumulate::Accumulator;
pub use binding::{AnimationTarget, BindingSet, TargetHandle};
pub use data::{Bezier, Clip, ClipError, Keypoint, Track, TrackTarget};
pub use ids::{ActionId, IdAllocator};
pub use mixer::{Action, LoopMode, Mixer};
pub use outputs::MixerEvent;
pub use sampling::sample_track;
pub use value::{Value, ValueKind};
