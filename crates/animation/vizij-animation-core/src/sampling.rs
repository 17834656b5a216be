//! Track sampling.
//!
//! Model:
//! - Each Track has keypoints ordered by absolute time (seconds).
//! - Before the first keypoint the first value holds; after the last, the last holds.
//! - Segment [Pi -> P(i+1)] timing is eased with P(i+1).curve (linear when absent),
//!   then values are blended with lerp (vectors/scalars) or slerp (rotations).

use crate::data::{Keypoint, Track};
use crate::interp::functions::{bezier_ease_t, linear_value};
use crate::value::Value;

/// Find the segment [i, i+1] containing `time`, returning (i, i+1, local_t).
/// Returns (k, k, 0) when `time` is outside the keyed range.
fn find_segment(points: &[Keypoint], time: f32) -> (usize, usize, f32) {
    let n = points.len();
    if n <= 1 || time <= points[0].time {
        return (0, 0, 0.0);
    }
    if time >= points[n - 1].time {
        return (n - 1, n - 1, 0.0);
    }
    // First keypoint strictly after `time`; guaranteed in 1..n by the checks above.
    let right = points.partition_point(|p| p.time <= time);
    let left = right - 1;
    let t0 = points[left].time;
    let t1 = points[right].time;
    let denom = (t1 - t0).max(f32::EPSILON);
    (left, right, ((time - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a single track at `time` seconds. Empty tracks yield `None`.
pub fn sample_track(track: &Track, time: f32) -> Option<Value> {
    let points = &track.points;
    match points.len() {
        0 => None,
        1 => Some(points[0].value),
        _ => {
            let (i0, i1, lt) = find_segment(points, time);
            if i0 == i1 {
                return Some(points[i0].value);
            }
            let right = &points[i1];
            let eased = right
                .curve
                .as_ref()
                .map_or(lt, |curve| bezier_ease_t(lt, curve));
            Some(linear_value(&points[i0].value, &right.value, eased))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrackTarget;

    fn fov_track(keys: &[(f32, f32)]) -> Track {
        Track::new(
            TrackTarget::CameraFov,
            keys.iter().map(|(t, v)| Keypoint::new(*t, *v)).collect(),
        )
    }

    #[test]
    fn holds_outside_range() {
        let track = fov_track(&[(1.0, 10.0), (2.0, 20.0)]);
        assert_eq!(sample_track(&track, 0.0), Some(Value::Float(10.0)));
        assert_eq!(sample_track(&track, 5.0), Some(Value::Float(20.0)));
    }

    #[test]
    fn interpolates_between_keys() {
        let track = fov_track(&[(0.0, 0.0), (1.0, 10.0), (3.0, 30.0)]);
        assert_eq!(sample_track(&track, 0.5), Some(Value::Float(5.0)));
        assert_eq!(sample_track(&track, 2.0), Some(Value::Float(20.0)));
        assert_eq!(sample_track(&track, 1.0), Some(Value::Float(10.0)));
    }

    #[test]
    fn duplicate_times_step() {
        let track = fov_track(&[(0.0, 0.0), (1.0, 10.0), (1.0, 50.0), (2.0, 50.0)]);
        assert_eq!(sample_track(&track, 1.0), Some(Value::Float(50.0)));
    }

    #[test]
    fn empty_track_samples_nothing() {
        assert_eq!(sample_track(&fov_track(&[]), 0.0), None);
    }
}
