//! # Heading resolution
//!
//! Every sample of a path carries the heading policy of the directive which produced it. The
//! yaw of each sample is resolved from the policy and the positions around it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use util::maths::wrap_pi;

use crate::geometry::horizontal;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Heading directions shorter than this are ignored and the previous yaw is held instead.
pub const HEADING_EPSILON: f64 = 1e-3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the yaw of the vehicle is chosen while executing a directive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeadingPolicy {
    /// Point along the direction of travel.
    Auto,

    /// Hold the previous heading.
    Still,

    /// Point towards the given XY point.
    TowardPoint([f64; 2]),

    /// Point along the given XY axis.
    FixedAxis([f64; 2]),
}

impl Default for HeadingPolicy {
    fn default() -> Self {
        HeadingPolicy::Auto
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Resolve the yaw of every sample.
///
/// The step from sample `i - 1` to sample `i` uses `policies[i]`. The first yaw is
/// `initial_yaw_rad`. All yaws are wrapped into `(-pi, pi]`.
///
/// `positions` and `policies` must have the same length.
pub fn resolve_yaw(
    positions: &[Vector3<f64>],
    policies: &[HeadingPolicy],
    initial_yaw_rad: f64,
) -> Vec<f64> {
    let mut yaw = Vec::with_capacity(positions.len());

    if positions.is_empty() {
        return yaw;
    }

    yaw.push(wrap_pi(initial_yaw_rad));

    for i in 1..positions.len() {
        let prev_yaw = yaw[i - 1];

        let direction: Option<Vector2<f64>> = match policies.get(i) {
            Some(HeadingPolicy::Auto) | None => {
                Some(horizontal(&positions[i]) - horizontal(&positions[i - 1]))
            }
            Some(HeadingPolicy::TowardPoint(p)) => {
                Some(Vector2::new(p[0], p[1]) - horizontal(&positions[i]))
            }
            Some(HeadingPolicy::FixedAxis(a)) => Some(Vector2::new(a[0], a[1])),
            Some(HeadingPolicy::Still) => None,
        };

        yaw.push(match direction {
            Some(d) if d.norm() >= HEADING_EPSILON => wrap_pi(d[1].atan2(d[0])),
            _ => prev_yaw,
        });
    }

    yaw
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
