//! Interpolation helpers.
//!
//! Keyframe segments are eased on time with a cubic-bezier curve and then blended
//! linearly (vectors, scalars) or spherically (rotations).

pub mod functions;

pub use functions::{bezier_ease_t, lerp_f32, linear_value};
