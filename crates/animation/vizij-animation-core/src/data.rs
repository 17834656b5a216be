//! Clip data model: tracks of timed keypoints aimed at bone or camera channels.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Cubic-bezier timing curve for the segment that *arrives* at a keypoint.
/// Control points live in the normalized 0..1 domain, the way motion files store them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Bezier {
    pub const LINEAR: Bezier = Bezier {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    /// Motion files quantize control points to 0..=127.
    pub fn from_quantized(x1: u8, y1: u8, x2: u8, y2: u8) -> Self {
        let n = |v: u8| f32::from(v.min(127)) / 127.0;
        Self {
            x1: n(x1),
            y1: n(y1),
            x2: n(x2),
            y2: n(y2),
        }
    }
}

/// A single keypoint at an absolute time (seconds) within the clip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub time: f32,
    pub value: Value,
    /// Timing curve from the previous keypoint to this one. `None` is linear.
    #[serde(default)]
    pub curve: Option<Bezier>,
}

impl Keypoint {
    pub fn new(time: f32, value: impl Into<Value>) -> Self {
        Self {
            time,
            value: value.into(),
            curve: None,
        }
    }

    pub fn with_curve(mut self, curve: Bezier) -> Self {
        self.curve = Some(curve);
        self
    }
}

/// Channel a track writes to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackTarget {
    BonePosition { bone: String },
    BoneRotation { bone: String },
    CameraPosition,
    CameraRotation,
    CameraFov,
    CameraTarget,
}

impl TrackTarget {
    pub fn bone_position(bone: impl Into<String>) -> Self {
        TrackTarget::BonePosition { bone: bone.into() }
    }

    pub fn bone_rotation(bone: impl Into<String>) -> Self {
        TrackTarget::BoneRotation { bone: bone.into() }
    }

    #[inline]
    pub fn is_bone(&self) -> bool {
        matches!(
            self,
            TrackTarget::BonePosition { .. } | TrackTarget::BoneRotation { .. }
        )
    }

    /// Value kind the channel expects.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            TrackTarget::BonePosition { .. }
            | TrackTarget::CameraPosition
            | TrackTarget::CameraTarget => ValueKind::Vec3,
            TrackTarget::BoneRotation { .. } | TrackTarget::CameraRotation => ValueKind::Quat,
            TrackTarget::CameraFov => ValueKind::Float,
        }
    }
}

impl fmt::Display for TrackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackTarget::BonePosition { bone } => write!(f, ".bones[{bone}].position"),
            TrackTarget::BoneRotation { bone } => write!(f, ".bones[{bone}].quaternion"),
            TrackTarget::CameraPosition => f.write_str(".position"),
            TrackTarget::CameraRotation => f.write_str(".quaternion"),
            TrackTarget::CameraFov => f.write_str(".fov"),
            TrackTarget::CameraTarget => f.write_str("target.position"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub target: TrackTarget,
    pub points: Vec<Keypoint>,
}

impl Track {
    pub fn new(target: TrackTarget, points: Vec<Keypoint>) -> Self {
        Self { target, points }
    }

    /// Time of the last keypoint, or 0 for an empty track.
    pub fn end_time(&self) -> f32 {
        self.points.last().map_or(0.0, |p| p.time)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClipError {
    #[error("clip '{clip}' has invalid duration {duration}")]
    InvalidDuration { clip: String, duration: f32 },
    #[error("keypoint time must be finite and >= 0 for '{target}'")]
    InvalidKeyTime { target: String },
    #[error("keypoint times must be non-decreasing for '{target}'")]
    UnorderedKeys { target: String },
    #[error("keypoint value kind {found:?} does not match channel '{target}' ({expected:?})")]
    KindMismatch {
        target: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// A named set of tracks. `duration` is the loop length in seconds and may be
/// rewritten after construction (timeline synchronization stretches it).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl Clip {
    /// Build a clip whose duration is the last keypoint time across all tracks.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let mut clip = Self {
            name: name.into(),
            duration: 0.0,
            tracks,
        };
        clip.reset_duration();
        clip
    }

    pub fn reset_duration(&mut self) {
        self.duration = self
            .tracks
            .iter()
            .map(Track::end_time)
            .fold(0.0f32, f32::max);
    }

    /// Whether loop notifications of this clip concern the skeleton. Only the first
    /// track is inspected; a clip without tracks counts as bone-affecting.
    pub fn affects_bones(&self) -> bool {
        self.tracks.first().map_or(true, |t| t.target.is_bone())
    }

    /// Validate basic invariants (finite, ordered key times and matching value kinds).
    pub fn validate_basic(&self) -> Result<(), ClipError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ClipError::InvalidDuration {
                clip: self.name.clone(),
                duration: self.duration,
            });
        }
        for track in &self.tracks {
            let expected = track.target.value_kind();
            let mut last = f32::NEG_INFINITY;
            for p in &track.points {
                if !p.time.is_finite() || p.time < 0.0 {
                    return Err(ClipError::InvalidKeyTime {
                        target: track.target.to_string(),
                    });
                }
                if p.time < last {
                    return Err(ClipError::UnorderedKeys {
                        target: track.target.to_string(),
                    });
                }
                if p.value.kind() != expected {
                    return Err(ClipError::KindMismatch {
                        target: track.target.to_string(),
                        expected,
                        found: p.value.kind(),
                    });
                }
                last = p.time;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn duration_is_last_key_time() {
        let clip = Clip::new(
            "walk",
            vec![
                Track::new(
                    TrackTarget::bone_position("center"),
                    vec![Keypoint::new(0.0, Vec3::ZERO), Keypoint::new(1.5, Vec3::X)],
                ),
                Track::new(
                    TrackTarget::bone_rotation("head"),
                    vec![Keypoint::new(2.25, Quat::IDENTITY)],
                ),
            ],
        );
        assert_eq!(clip.duration, 2.25);
        assert!(clip.validate_basic().is_ok());
    }

    #[test]
    fn camera_clip_does_not_affect_bones() {
        let clip = Clip::new(
            "cam",
            vec![Track::new(
                TrackTarget::CameraFov,
                vec![Keypoint::new(0.0, 30.0_f32)],
            )],
        );
        assert!(!clip.affects_bones());
        assert!(Clip::new("empty", vec![]).affects_bones());
    }

    #[test]
    fn validate_rejects_unordered_and_mismatched_keys() {
        let unordered = Clip::new(
            "bad",
            vec![Track::new(
                TrackTarget::CameraFov,
                vec![Keypoint::new(1.0, 30.0_f32), Keypoint::new(0.5, 40.0_f32)],
            )],
        );
        assert!(matches!(
            unordered.validate_basic(),
            Err(ClipError::UnorderedKeys { .. })
        ));

        let mismatched = Clip::new(
            "bad",
            vec![Track::new(
                TrackTarget::bone_rotation("arm"),
                vec![Keypoint::new(0.0, Vec3::ONE)],
            )],
        );
        assert!(matches!(
            mismatched.validate_basic(),
            Err(ClipError::KindMismatch { .. })
        ));
    }

    #[test]
    fn quantized_bezier_normalizes() {
        let b = Bezier::from_quantized(20, 20, 107, 107);
        assert!((b.x1 - 20.0 / 127.0).abs() < 1e-6);
        assert!((b.y2 - 107.0 / 127.0).abs() < 1e-6);
    }
}
