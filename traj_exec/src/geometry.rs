//! # Geometry primitives
//!
//! Small vector helpers used when discretising path segments.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distances below this are treated as zero when deciding whether a segment is degenerate.
pub const MIN_SEGMENT_LENGTH_M: f64 = 1e-9;

/// Components of a unit direction below this are ignored when projecting per-axis limits.
const MIN_DIRECTION_COMPONENT: f64 = 1e-12;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Return the horizontal (XY) part of a position.
pub fn horizontal(v: &Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v[0], v[1])
}

/// Find the largest magnitude `s` such that `s * direction` does not exceed any per-axis limit.
///
/// The direction need not be normalised, it is normalised here. Returns `None` if the direction
/// has (near) zero length.
pub fn project_limits(direction: &Vector3<f64>, limits: &[f64; 3]) -> Option<f64> {
    let norm = direction.norm();

    if norm < MIN_SEGMENT_LENGTH_M {
        return None;
    }

    let unit = direction / norm;

    let mut limit = f64::INFINITY;
    for i in 0..3 {
        let component = unit[i].abs();
        if component > MIN_DIRECTION_COMPONENT {
            limit = limit.min(limits[i] / component);
        }
    }

    Some(limit)
}

/// Rotate a 2D vector by the rotation described by a precomputed cos/sin pair.
pub fn rotate(v: &Vector2<f64>, cos: f64, sin: f64) -> Vector2<f64> {
    Vector2::new(cos * v[0] - sin * v[1], sin * v[0] + cos * v[1])
}

/// Length of the arc travelled by `revolutions` turns about a circle of the given radius.
pub fn arc_length(radius_m: f64, revolutions: f64) -> f64 {
    2.0 * std::f64::consts::PI * radius_m * revolutions.abs()
}

/// Horizontal acceleration budget available to a circular move, from the per-axis limits.
///
/// The tighter of the X and Y limits is shared between the two axes.
pub fn circle_accel_limit(max_accel_ms2: &[f64; 3]) -> f64 {
    max_accel_ms2[0].min(max_accel_ms2[1]) / std::f64::consts::SQRT_2
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_project_limits() {
        let limits = [1.0, 2.0, 3.0];

        // Along a single axis the limit is that axis' limit
        assert_eq!(project_limits(&Vector3::new(5.0, 0.0, 0.0), &limits), Some(1.0));
        assert_eq!(project_limits(&Vector3::new(0.0, -1.0, 0.0), &limits), Some(2.0));
        assert_eq!(project_limits(&Vector3::new(0.0, 0.0, 0.1), &limits), Some(3.0));

        // Diagonal is limited by the tightest axis
        let s = project_limits(&Vector3::new(1.0, 1.0, 0.0), &limits).unwrap();
        assert!((s - std::f64::consts::SQRT_2).abs() < 1e-12);

        // Zero direction has no projection
        assert_eq!(project_limits(&Vector3::zeros(), &limits), None);
    }

    #[test]
    fn test_rotate() {
        let half_pi = std::f64::consts::FRAC_PI_2;
        let v = rotate(&Vector2::new(1.0, 0.0), half_pi.cos(), half_pi.sin());

        assert!((v[0] - 0.0).abs() < 1e-12);
        assert!((v[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_arc_length() {
        let l = arc_length(2.0, -1.5);
        assert!((l - 6.0 * std::f64::consts::PI).abs() < 1e-12);
    }
}
