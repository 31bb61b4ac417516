//! # Trajectory states
//!
//! A [`Trajectory`] is built up sample by sample during the build phase, then frozen into a
//! [`FrozenTrajectory`] which the publisher reads from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use comms_if::traj::TrajectoryPoint;

use crate::heading::HeadingPolicy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The kinematic state of the vehicle at one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Time of the sample from the start of the trajectory
    pub t_s: f64,

    pub position_m: Vector3<f64>,

    /// Yaw in `(-pi, pi]`
    pub yaw_rad: f64,

    pub velocity_ms: Vector3<f64>,

    pub accel_ms2: Vector3<f64>,
}

/// A trajectory under construction.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub states: Vec<State>,

    /// Heading policy of each sample, parallel to `states`
    pub policies: Vec<HeadingPolicy>,

    pub sample_rate_hz: f64,
}

/// The immutable result of the build phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrozenTrajectory {
    states: Vec<State>,

    stage: TrajectoryStage,

    sample_rate_hz: f64,
}

/// A flat row of the states archive.
#[derive(Debug, Serialize)]
pub struct StateRecord {
    pub t_s: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub yaw_rad: f64,
    pub vx_ms: f64,
    pub vy_ms: f64,
    pub vz_ms: f64,
    pub ax_ms2: f64,
    pub ay_ms2: f64,
    pub az_ms2: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which stage of the build phase produced a frozen trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrajectoryStage {
    /// Straight out of the differentiator
    Unfiltered,

    /// Passed through at least one smoothing or saturation stage
    Filtered,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State {
    /// Build the trajectory message point for this state.
    pub fn to_point(&self) -> TrajectoryPoint {
        TrajectoryPoint {
            positions: [
                self.position_m[0],
                self.position_m[1],
                self.position_m[2],
                self.yaw_rad,
            ],
            velocities: [self.velocity_ms[0], self.velocity_ms[1], self.velocity_ms[2]],
            accelerations: [self.accel_ms2[0], self.accel_ms2[1], self.accel_ms2[2]],
            time_from_start_s: self.t_s,
        }
    }
}

impl Trajectory {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            states: Vec::new(),
            policies: Vec::new(),
            sample_rate_hz,
        }
    }

    /// Append a state and the heading policy it was built with.
    pub fn push(&mut self, state: State, policy: HeadingPolicy) {
        self.states.push(state);
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Copy out the positions of every state.
    pub fn positions(&self) -> Vec<Vector3<f64>> {
        self.states.iter().map(|s| s.position_m).collect()
    }

    /// Freeze the trajectory, tagging it with the stage that produced it.
    pub fn freeze(self, stage: TrajectoryStage) -> FrozenTrajectory {
        FrozenTrajectory {
            states: self.states,
            stage,
            sample_rate_hz: self.sample_rate_hz,
        }
    }
}

impl FrozenTrajectory {
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn stage(&self) -> TrajectoryStage {
        self.stage
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Time of the last sample, or zero for an empty trajectory.
    pub fn duration_s(&self) -> f64 {
        self.states.last().map(|s| s.t_s).unwrap_or(0.0)
    }

    /// Largest absolute speed and acceleration reached on each axis.
    pub fn peak_magnitudes(&self) -> ([f64; 3], [f64; 3]) {
        let mut speed = [0.0f64; 3];
        let mut accel = [0.0f64; 3];

        for s in self.states.iter() {
            for i in 0..3 {
                speed[i] = speed[i].max(s.velocity_ms[i].abs());
                accel[i] = accel[i].max(s.accel_ms2[i].abs());
            }
        }

        (speed, accel)
    }
}

impl From<&State> for StateRecord {
    fn from(s: &State) -> Self {
        Self {
            t_s: s.t_s,
            x_m: s.position_m[0],
            y_m: s.position_m[1],
            z_m: s.position_m[2],
            yaw_rad: s.yaw_rad,
            vx_ms: s.velocity_ms[0],
            vy_ms: s.velocity_ms[1],
            vz_ms: s.velocity_ms[2],
            ax_ms2: s.accel_ms2[0],
            ay_ms2: s.accel_ms2[1],
            az_ms2: s.accel_ms2[2],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_freeze() {
        let mut traj = Trajectory::new(100.0);
        let state = State {
            t_s: 0.01,
            position_m: Vector3::new(1.0, 2.0, 3.0),
            yaw_rad: 0.5,
            velocity_ms: Vector3::new(-1.0, 0.0, 0.0),
            accel_ms2: Vector3::new(0.0, 0.0, 2.0),
        };
        traj.push(state, HeadingPolicy::Auto);

        let frozen = traj.freeze(TrajectoryStage::Filtered);

        assert_eq!(frozen.len(), 1);
        assert_eq!(frozen.stage(), TrajectoryStage::Filtered);
        assert_eq!(frozen.duration_s(), 0.01);
        assert_eq!(frozen.peak_magnitudes(), ([1.0, 0.0, 0.0], [0.0, 0.0, 2.0]));

        let point = frozen.states()[0].to_point();
        assert_eq!(point.positions, [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(point.velocities, [-1.0, 0.0, 0.0]);
        assert_eq!(point.accelerations, [0.0, 0.0, 2.0]);
        assert_eq!(point.time_from_start_s, 0.01);
    }
}
