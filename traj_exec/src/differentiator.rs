//! # Kinematic state differentiator
//!
//! Turns raw positions into full kinematic states by finite differences at the sample rate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

use crate::{
    heading::{self, HeadingPolicy},
    params::TrajGenParams,
    path_builder::RawPath,
    state::{State, Trajectory},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Derives heading, velocity and acceleration from raw positions.
#[derive(Debug, Clone)]
pub struct KinematicStateDifferentiator {
    sample_rate_hz: f64,

    settle_samples: usize,

    initial_yaw_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinematicStateDifferentiator {
    pub fn new(params: &TrajGenParams) -> Self {
        Self {
            sample_rate_hz: params.sample_rate_hz,
            settle_samples: params.settle_samples(),
            initial_yaw_rad: params.initial_yaw_rad,
        }
    }

    /// Differentiate the raw path.
    ///
    /// The last position is first held for the settle duration with the `Still` policy.
    pub fn differentiate(&self, raw: RawPath) -> Trajectory {
        let RawPath {
            mut positions_m,
            mut policies,
        } = raw;

        if let Some(last) = positions_m.last().copied() {
            positions_m.extend(std::iter::repeat(last).take(self.settle_samples));
            policies.extend(std::iter::repeat(HeadingPolicy::Still).take(self.settle_samples));
        }

        let velocities = finite_differences(&positions_m, self.sample_rate_hz);
        let accels = finite_differences(&velocities, self.sample_rate_hz);
        let yaws = heading::resolve_yaw(&positions_m, &policies, self.initial_yaw_rad);

        let mut traj = Trajectory::new(self.sample_rate_hz);

        for (i, policy) in policies.into_iter().enumerate() {
            traj.push(
                State {
                    t_s: sample_time(i, self.sample_rate_hz),
                    position_m: positions_m[i],
                    yaw_rad: yaws[i],
                    velocity_ms: velocities[i],
                    accel_ms2: accels[i],
                },
                policy,
            );
        }

        traj
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Backward differences of a series, scaled by the sample rate. The first entry is zero.
pub fn finite_differences(values: &[Vector3<f64>], sample_rate_hz: f64) -> Vec<Vector3<f64>> {
    let mut diffs = Vec::with_capacity(values.len());

    if values.is_empty() {
        return diffs;
    }

    diffs.push(Vector3::zeros());
    for w in values.windows(2) {
        diffs.push((w[1] - w[0]) * sample_rate_hz);
    }

    diffs
}

/// Time of sample `i`.
pub fn sample_time(i: usize, sample_rate_hz: f64) -> f64 {
    i as f64 / sample_rate_hz
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
