//! # Step profiles
//!
//! A step profile decides how far along a segment each new sample lies. Both profiles return the
//! cumulative distance of every new sample, the start of the segment itself is never included,
//! and the final entry is always exactly the segment's length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geometry::MIN_SEGMENT_LENGTH_M;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when rounding a number of steps up, so that exact multiples of the step
/// don't gain an extra sample from floating point noise.
const STEP_COUNT_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The strategy used to size the steps of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// Acceleration limited trapezoidal (or triangular) speed profile.
    Trapezoidal,

    /// Constant speed, every step has the same length.
    Linear,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StepMode {
    fn default() -> Self {
        StepMode::Trapezoidal
    }
}

impl StepMode {
    /// Compute the cumulative distance of each new sample along a segment of length
    /// `distance_m`.
    ///
    /// `accel_ms2` is only used by the trapezoidal profile.
    pub fn profile(
        &self,
        distance_m: f64,
        speed_ms: f64,
        accel_ms2: f64,
        sample_rate_hz: f64,
    ) -> Vec<f64> {
        match self {
            StepMode::Trapezoidal => trapezoidal(distance_m, speed_ms, accel_ms2, sample_rate_hz),
            StepMode::Linear => linear(distance_m, speed_ms, sample_rate_hz),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Constant speed profile.
///
/// The number of steps is `ceil(d / (v / f))` and sample `k` lies at `d * k / n`, so no step is
/// longer than `v / f`.
pub fn linear(distance_m: f64, speed_ms: f64, sample_rate_hz: f64) -> Vec<f64> {
    if !is_valid(distance_m, speed_ms, sample_rate_hz) {
        return Vec::new();
    }

    let step_m = speed_ms / sample_rate_hz;
    let num_steps = ((distance_m / step_m) - STEP_COUNT_TOLERANCE).ceil().max(1.0) as usize;

    (1..=num_steps)
        .map(|k| distance_m * (k as f64) / (num_steps as f64))
        .collect()
}

/// Acceleration limited trapezoidal profile.
///
/// Accelerates at `accel_ms2` up to `speed_ms`, cruises, then decelerates symmetrically to rest
/// at the end of the segment. Short segments never reach the cruise speed and follow a
/// triangular profile instead, peaking at `sqrt(d * a)`.
pub fn trapezoidal(
    distance_m: f64,
    speed_ms: f64,
    accel_ms2: f64,
    sample_rate_hz: f64,
) -> Vec<f64> {
    if !is_valid(distance_m, speed_ms, sample_rate_hz) || !(accel_ms2 > 0.0) {
        return Vec::new();
    }

    // Peak speed and the time spent accelerating to it
    let peak_speed_ms = speed_ms.min((distance_m * accel_ms2).sqrt());
    let accel_time_s = peak_speed_ms / accel_ms2;
    let accel_dist_m = 0.5 * accel_ms2 * accel_time_s * accel_time_s;

    // Cruise covers whatever is left over
    let cruise_time_s = ((distance_m - 2.0 * accel_dist_m) / peak_speed_ms).max(0.0);
    let total_time_s = 2.0 * accel_time_s + cruise_time_s;

    let distance_at = |t: f64| -> f64 {
        if t <= accel_time_s {
            0.5 * accel_ms2 * t * t
        } else if t <= accel_time_s + cruise_time_s {
            accel_dist_m + peak_speed_ms * (t - accel_time_s)
        } else {
            let remaining_s = (total_time_s - t).max(0.0);
            distance_m - 0.5 * accel_ms2 * remaining_s * remaining_s
        }
    };

    let num_steps = (total_time_s * sample_rate_hz - STEP_COUNT_TOLERANCE)
        .ceil()
        .max(1.0) as usize;

    let mut profile: Vec<f64> = (1..num_steps)
        .map(|k| distance_at(k as f64 / sample_rate_hz).min(distance_m))
        .collect();
    profile.push(distance_m);

    profile
}

fn is_valid(distance_m: f64, speed_ms: f64, sample_rate_hz: f64) -> bool {
    distance_m.is_finite()
        && distance_m > MIN_SEGMENT_LENGTH_M
        && speed_ms > 0.0
        && sample_rate_hz > 0.0
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn max_step(profile: &[f64]) -> f64 {
        let mut prev = 0.0;
        let mut max = 0.0f64;
        for d in profile {
            max = max.max(d - prev);
            prev = *d;
        }
        max
    }

    #[test]
    fn test_linear() {
        // 1 m at 0.5 m/s and 100 Hz is exactly 200 steps of 5 mm
        let p = linear(1.0, 0.5, 100.0);
        assert_eq!(p.len(), 200);
        assert!((p[0] - 0.005).abs() < 1e-12);
        assert_eq!(*p.last().unwrap(), 1.0);

        // Non-multiple distances round the number of steps up
        let p = linear(1.001, 0.5, 100.0);
        assert_eq!(p.len(), 201);
        assert!(max_step(&p) <= 0.005 + 1e-12);
    }

    #[test]
    fn test_trapezoidal_reaches_cruise() {
        let p = trapezoidal(4.0, 1.0, 2.0, 100.0);

        // Accel takes 0.5 s over 0.25 m each end, leaving 3.5 m of cruise, 4.5 s in total
        assert_eq!(p.len(), 450);
        assert_eq!(*p.last().unwrap(), 4.0);
        assert!(max_step(&p) <= 1.0 / 100.0 + 1e-12);

        // First step follows the acceleration phase
        assert!((p[0] - 0.5 * 2.0 * 0.01 * 0.01).abs() < 1e-12);

        // Monotonic
        for w in p.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_trapezoidal_triangular() {
        // Too short to reach cruise: peak at sqrt(0.1 * 2) ~= 0.447 m/s
        let p = trapezoidal(0.1, 1.0, 2.0, 100.0);
        let peak = (0.1f64 * 2.0).sqrt();

        assert_eq!(*p.last().unwrap(), 0.1);
        assert!(max_step(&p) <= peak / 100.0 + 1e-9);
    }

    #[test]
    fn test_degenerate_profiles() {
        assert!(trapezoidal(0.0, 1.0, 1.0, 100.0).is_empty());
        assert!(linear(0.0, 1.0, 100.0).is_empty());
        assert!(linear(1.0, 0.0, 100.0).is_empty());
        assert!(trapezoidal(1.0, 1.0, 0.0, 100.0).is_empty());
    }

    #[test]
    fn test_step_mode_default() {
        assert_eq!(StepMode::default(), StepMode::Trapezoidal);
        assert_eq!(
            StepMode::Linear.profile(1.0, 0.5, 123.0, 100.0),
            linear(1.0, 0.5, 100.0)
        );
    }
}
