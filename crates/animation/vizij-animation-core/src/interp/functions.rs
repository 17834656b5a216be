//! Interpolation helpers:
//! - linear_value (component-wise lerp + quaternion slerp)
//! - bezier_ease_t (cubic-bezier timing, x inverted by bisection)

use crate::data::Bezier;
use crate::value::Value;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Blend two values of the same kind. Rotations take the shortest arc.
pub fn linear_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Float(va), Value::Float(vb)) => Value::Float(lerp_f32(*va, *vb, t)),
        (Value::Vec3(va), Value::Vec3(vb)) => Value::Vec3(va.lerp(*vb, t)),
        (Value::Quat(qa), Value::Quat(qb)) => Value::Quat(qa.slerp(*qb, t)),
        // Fallback: if types mismatch, prefer left (fail-soft).
        _ => *a,
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given a timing curve and an input t in [0,1], compute the eased progress by
/// inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, curve: &Bezier) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Fast path: Bezier(0,0,1,1) is exactly linear -> eased t == t
    if *curve == Bezier::LINEAR {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, curve.x1, curve.x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, curve.y1, curve.y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn linear_curve_is_identity() {
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert_eq!(bezier_ease_t(t, &Bezier::LINEAR), t);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_and_pinned() {
        let curve = Bezier {
            x1: 0.42,
            y1: 0.0,
            x2: 0.58,
            y2: 1.0,
        };
        assert!(bezier_ease_t(0.0, &curve).abs() < 1e-5);
        assert!((bezier_ease_t(1.0, &curve) - 1.0).abs() < 1e-5);
        assert!((bezier_ease_t(0.5, &curve) - 0.5).abs() < 1e-3);
        assert!(bezier_ease_t(0.2, &curve) < 0.2);
    }

    #[test]
    fn blends_each_kind() {
        assert_eq!(
            linear_value(&Value::Float(0.0), &Value::Float(10.0), 0.25),
            Value::Float(2.5)
        );
        assert_eq!(
            linear_value(&Value::Vec3(Vec3::ZERO), &Value::Vec3(Vec3::new(2.0, 4.0, 6.0)), 0.5),
            Value::Vec3(Vec3::new(1.0, 2.0, 3.0))
        );
        let half = linear_value(
            &Value::Quat(Quat::IDENTITY),
            &Value::Quat(Quat::from_rotation_y(1.0)),
            0.5,
        );
        let q = half.as_quat().unwrap();
        assert!(q.angle_between(Quat::from_rotation_y(0.5)) < 1e-4);
        // Mismatched kinds keep the left value.
        assert_eq!(
            linear_value(&Value::Float(1.0), &Value::Vec3(Vec3::ONE), 0.5),
            Value::Float(1.0)
        );
    }
}
