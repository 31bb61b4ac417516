//! # Rate limiting
//!
//! Causal rate-limited integrator. The output velocity chases the target velocity with
//! saturated acceleration and speed, and positions are re-integrated from the origin.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

use util::maths::saturate;

use super::Limits;
use crate::state::{State, Trajectory};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply the rate limiter, chasing the trajectory's own velocities.
pub fn apply(traj: &Trajectory, limits: &Limits) -> Trajectory {
    let targets: Vec<Vector3<f64>> = traj.states.iter().map(|s| s.velocity_ms).collect();

    integrate(traj, &targets, limits)
}

/// Chase the given target velocities from rest at the trajectory's first position.
///
/// Times, yaws and heading policies are carried over from `traj` unchanged. `targets` must have
/// one entry per state.
pub fn integrate(traj: &Trajectory, targets: &[Vector3<f64>], limits: &Limits) -> Trajectory {
    let mut out = Trajectory::new(traj.sample_rate_hz);

    let first = match traj.states.first() {
        Some(s) => s,
        None => return out,
    };

    let f = limits.sample_rate_hz;

    out.push(
        State {
            velocity_ms: Vector3::zeros(),
            accel_ms2: Vector3::zeros(),
            ..*first
        },
        traj.policies[0],
    );

    let mut position_m = first.position_m;
    let mut velocity_ms = Vector3::zeros();

    for i in 1..traj.states.len() {
        let mut accel_ms2 = Vector3::zeros();
        let prev_velocity_ms = velocity_ms;

        for axis in 0..3 {
            let max_accel = limits.max_accel_ms2[axis];
            let max_speed = limits.max_speed_ms[axis];

            let a = saturate((targets[i][axis] - prev_velocity_ms[axis]) * f, max_accel);
            velocity_ms[axis] = saturate(prev_velocity_ms[axis] + a / f, max_speed);

            // Record the change actually realised, the speed clamp may have cut it short
            accel_ms2[axis] = saturate((velocity_ms[axis] - prev_velocity_ms[axis]) * f, max_accel);
        }

        position_m += velocity_ms / f;

        out.push(
            State {
                t_s: traj.states[i].t_s,
                position_m,
                yaw_rad: traj.states[i].yaw_rad,
                velocity_ms,
                accel_ms2,
            },
            traj.policies[i],
        );
    }

    out
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::heading::HeadingPolicy;

    fn step_trajectory() -> Trajectory {
        // Velocity steps from 0 to 1 m/s along x at 10 Hz
        let mut traj = Trajectory::new(10.0);
        for i in 0..20 {
            let vx = if i == 0 { 0.0 } else { 1.0 };
            traj.push(
                State {
                    t_s: i as f64 / 10.0,
                    position_m: Vector3::new((i as f64) * 0.1, 0.0, 0.0),
                    yaw_rad: 0.0,
                    velocity_ms: Vector3::new(vx, 0.0, 0.0),
                    accel_ms2: Vector3::zeros(),
                },
                HeadingPolicy::Auto,
            );
        }
        traj
    }

    #[test]
    fn test_rate_limit_step() {
        let limits = Limits {
            sample_rate_hz: 10.0,
            max_accel_ms2: [2.0, 2.0, 2.0],
            max_speed_ms: [0.8, 0.8, 0.8],
        };

        let out = apply(&step_trajectory(), &limits);

        assert_eq!(out.len(), 20);

        let vx: Vec<f64> = out.states.iter().map(|s| s.velocity_ms[0]).collect();

        // Ramps at 0.2 m/s per sample, then clamps at 0.8 m/s
        assert!((vx[1] - 0.2).abs() < 1e-12);
        assert!((vx[2] - 0.4).abs() < 1e-12);
        assert!((vx[4] - 0.8).abs() < 1e-12);
        assert!((vx[10] - 0.8).abs() < 1e-12);

        for s in out.states.iter() {
            assert!(s.accel_ms2[0].abs() <= 2.0);
            assert!(s.velocity_ms[0].abs() <= 0.8);
        }

        // Positions integrate the limited velocity from the origin
        assert_eq!(out.states[0].position_m, Vector3::zeros());
        assert!((out.states[1].position_m[0] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_rate_limit_empty() {
        let limits = Limits {
            sample_rate_hz: 10.0,
            max_accel_ms2: [1.0; 3],
            max_speed_ms: [1.0; 3],
        };

        assert!(apply(&Trajectory::new(10.0), &limits).is_empty());
    }
}
