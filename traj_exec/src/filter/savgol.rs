//! # Savitzky-Golay smoothing
//!
//! Zero-phase local polynomial smoothing. Each output sample is the value at the center of a
//! least-squares polynomial fitted over a window of its neighbours, with the series mirrored at
//! both ends.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::{DMatrix, Vector3};

use super::{rate_limit, Limits, SavGolSeries};
use crate::{differentiator::finite_differences, state::Trajectory};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply one Savitzky-Golay stage to the trajectory, followed by the saturation pass.
pub fn apply(
    traj: &Trajectory,
    window: usize,
    order: usize,
    series: SavGolSeries,
    limits: &Limits,
) -> Trajectory {
    let targets = match series {
        SavGolSeries::Velocity => {
            let velocities: Vec<Vector3<f64>> =
                traj.states.iter().map(|s| s.velocity_ms).collect();
            smooth_vectors(&velocities, window, order)
        }
        SavGolSeries::Position => {
            let positions = smooth_vectors(&traj.positions(), window, order);
            finite_differences(&positions, limits.sample_rate_hz)
        }
    };

    rate_limit::integrate(traj, &targets, limits)
}

/// Smooth each axis of a series of vectors independently.
pub fn smooth_vectors(values: &[Vector3<f64>], window: usize, order: usize) -> Vec<Vector3<f64>> {
    let mut out = vec![Vector3::zeros(); values.len()];

    for axis in 0..3 {
        let series: Vec<f64> = values.iter().map(|v| v[axis]).collect();
        for (i, v) in smooth(&series, window, order).into_iter().enumerate() {
            out[i][axis] = v;
        }
    }

    out
}

/// Smooth a series.
///
/// Windows longer than the series shrink to the largest odd window that fits. If no window can
/// fit a polynomial of the given order the series is returned unchanged.
pub fn smooth(series: &[f64], window: usize, order: usize) -> Vec<f64> {
    let n = series.len();

    let window = if window <= n {
        window
    } else if n % 2 == 1 {
        n
    } else {
        n.saturating_sub(1)
    };

    let coeffs = match coefficients(window, order) {
        Some(c) => c,
        None => {
            debug!(
                "No valid Savitzky-Golay window of order {} for a series of {} samples, skipping",
                order, n
            );
            return series.to_vec();
        }
    };

    let half = (window / 2) as isize;

    (0..n as isize)
        .map(|i| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| c * series[mirror_index(i + k as isize - half, n)])
                .sum::<f64>()
        })
        .collect()
}

/// Compute the smoothing coefficients of the given window and polynomial order.
///
/// Returns `None` if the window is even, zero, or not longer than the order.
pub fn coefficients(window: usize, order: usize) -> Option<Vec<f64>> {
    if window == 0 || window % 2 == 0 || order >= window {
        return None;
    }

    let half = (window / 2) as f64;

    // Vandermonde matrix of the window's sample offsets
    let a = DMatrix::from_fn(window, order + 1, |i, j| (i as f64 - half).powi(j as i32));

    // The fitted value at the center is the constant term, the first row of the pseudo-inverse
    let ata_inv = (a.transpose() * &a).try_inverse()?;
    let pinv = ata_inv * a.transpose();

    Some(pinv.row(0).iter().copied().collect())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Fold an index into `[0, n)` by mirroring about the end samples without repeating them.
///
/// `-1` maps to `1` and `n` maps to `n - 2`.
fn mirror_index(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }

    let period = 2 * (n as isize - 1);
    let j = i.rem_euclid(period);

    if j >= n as isize {
        (period - j) as usize
    } else {
        j as usize
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
