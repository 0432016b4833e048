//! Angle arithmetic for wheel rotations.
//!
//! Convention: increasing angle = clockwise, all normalized values live in
//! `[0, TAU)`. Rotations are accumulated unbounded in f64 and only normalized
//! at comparison/render boundaries.

use std::f64::consts::TAU;

/// Normalize an angle into `[0, TAU)`.
#[inline]
pub fn normalize(angle: f64) -> f64 {
    let a = angle % TAU;
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}

/// Smallest non-negative clockwise rotation that carries `from` onto `to`.
#[inline]
pub fn forward_distance(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Check two angles for equality on the circle within `epsilon` radians.
pub fn circle_eq(a: f64, b: f64, epsilon: f64) -> bool {
    let d = forward_distance(a, b);
    d < epsilon || TAU - d < epsilon
}
