//! Pixel transforms applied between decoding and encoding.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise
//! - Angles are normalized modulo 360 before use
//! - Origin is the top-left corner, `y` grows downward

mod rotation;

pub use rotation::{
    apply_rotation, compute_rotated_bounds, normalize_angle, InterpolationFilter, TransformError,
};
