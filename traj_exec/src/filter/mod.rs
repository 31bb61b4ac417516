//! # Smoothing and saturation filter
//!
//! Runs the configured chain of filter stages over a differentiated trajectory, each stage
//! working on the output of the one before. Whatever the chain does, every stage ends with a
//! saturation pass so that the result respects the per-axis speed and acceleration limits.
//!
//! Heading is recomputed from the filtered positions once the chain has run, and optionally
//! smoothed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod rate_limit;
pub mod savgol;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

use util::maths::wrap_pi;

use crate::{
    heading,
    params::TrajGenParams,
    state::{FrozenTrajectory, Trajectory, TrajectoryStage},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Polynomial order of the yaw smoothing pass.
const YAW_SMOOTHING_ORDER: usize = 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits enforced by the saturation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub sample_rate_hz: f64,

    pub max_accel_ms2: [f64; 3],

    pub max_speed_ms: [f64; 3],
}

/// Applies the configured filter chain.
pub struct SmoothingFilter<'p> {
    params: &'p TrajGenParams,

    limits: Limits,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One stage of the filter chain.
///
/// In parameter files the stage is given by the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterStage {
    /// Causal rate-limited integrator
    RateLimit,

    /// Offline zero-phase Savitzky-Golay smoothing
    SavGol {
        window: usize,

        order: usize,

        #[serde(default)]
        series: SavGolSeries,
    },
}

/// The series a Savitzky-Golay stage smooths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavGolSeries {
    /// Smooth the velocities directly
    Velocity,

    /// Smooth the positions and re-differentiate them into velocities
    Position,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SavGolSeries {
    fn default() -> Self {
        SavGolSeries::Velocity
    }
}

impl From<&TrajGenParams> for Limits {
    fn from(params: &TrajGenParams) -> Self {
        Self {
            sample_rate_hz: params.sample_rate_hz,
            max_accel_ms2: params.max_accel_ms2,
            max_speed_ms: params.max_speed_ms,
        }
    }
}

impl<'p> SmoothingFilter<'p> {
    pub fn new(params: &'p TrajGenParams) -> Self {
        Self {
            params,
            limits: Limits::from(params),
        }
    }

    /// Run the chain and freeze the result.
    ///
    /// An empty chain freezes the trajectory as it is, tagged `Unfiltered`.
    pub fn apply(&self, traj: Trajectory) -> FrozenTrajectory {
        if self.params.filter_chain.is_empty() {
            return traj.freeze(TrajectoryStage::Unfiltered);
        }

        let mut traj = traj;

        for (i, stage) in self.params.filter_chain.iter().enumerate() {
            traj = match *stage {
                FilterStage::RateLimit => rate_limit::apply(&traj, &self.limits),
                FilterStage::SavGol {
                    window,
                    order,
                    series,
                } => savgol::apply(&traj, window, order, series, &self.limits),
            };

            info!("Filter stage {} ({:?}) applied", i, stage);
        }

        // Heading follows the filtered positions
        let yaws = heading::resolve_yaw(
            &traj.positions(),
            &traj.policies,
            self.params.initial_yaw_rad,
        );

        let yaws = match self.params.yaw_smoothing_window {
            Some(window) => smooth_yaw(&yaws, window),
            None => yaws,
        };

        for (state, yaw) in traj.states.iter_mut().zip(yaws.into_iter()) {
            state.yaw_rad = yaw;
        }

        traj.freeze(TrajectoryStage::Filtered)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Smooth a yaw series over its cosine and sine, so that wrapping at `pi` is handled.
pub fn smooth_yaw(yaws: &[f64], window: usize) -> Vec<f64> {
    let cos: Vec<f64> = yaws.iter().map(|y| y.cos()).collect();
    let sin: Vec<f64> = yaws.iter().map(|y| y.sin()).collect();

    let cos = savgol::smooth(&cos, window, YAW_SMOOTHING_ORDER);
    let sin = savgol::smooth(&sin, window, YAW_SMOOTHING_ORDER);

    cos.iter()
        .zip(sin.iter())
        .map(|(c, s)| wrap_pi(s.atan2(*c)))
        .collect()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        differentiator::KinematicStateDifferentiator, directive::Directive,
        geometry::horizontal, heading::HeadingPolicy, path_builder::PathSegmentBuilder,
    };
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    fn build(params: &TrajGenParams) -> Trajectory {
        let mut builder = PathSegmentBuilder::new(params, Vector3::zeros()).unwrap();
        builder.append(&Directive::takeoff(1.0)).unwrap();
        builder.append(&Directive::fly_to([1.0, 1.0, 1.0])).unwrap();
        builder
            .append(&Directive::circle([0.0, 1.0, 1.0], 1.0))
            .unwrap();
        builder.append(&Directive::land()).unwrap();

        KinematicStateDifferentiator::new(params).differentiate(builder.finish())
    }

    #[test]
    fn test_empty_chain_is_unfiltered() {
        let params = TrajGenParams::default();
        let traj = build(&params);
        let len = traj.len();

        let frozen = SmoothingFilter::new(&params).apply(traj);

        assert_eq!(frozen.stage(), TrajectoryStage::Unfiltered);
        assert_eq!(frozen.len(), len);
    }

    #[test]
    fn test_chain_respects_limits() {
        let params = TrajGenParams {
            max_accel_ms2: [0.5, 0.5, 0.5],
            max_speed_ms: [0.3, 0.3, 0.3],
            filter_chain: vec![
                FilterStage::SavGol {
                    window: 53,
                    order: 1,
                    series: SavGolSeries::Velocity,
                },
                FilterStage::SavGol {
                    window: 13,
                    order: 1,
                    series: SavGolSeries::Position,
                },
                FilterStage::RateLimit,
            ],
            yaw_smoothing_window: Some(53),
            ..Default::default()
        };
        let traj = build(&params);
        let len = traj.len();

        let frozen = SmoothingFilter::new(&params).apply(traj);

        assert_eq!(frozen.stage(), TrajectoryStage::Filtered);
        assert_eq!(frozen.len(), len);

        for (i, s) in frozen.states().iter().enumerate() {
            for axis in 0..3 {
                assert!(s.accel_ms2[axis].abs() <= params.max_accel_ms2[axis]);
                assert!(s.velocity_ms[axis].abs() <= params.max_speed_ms[axis]);
            }
            assert!(s.yaw_rad > -PI && s.yaw_rad <= PI);
            assert_eq!(s.t_s, i as f64 / params.sample_rate_hz);
        }

        // The filtered trajectory still starts at the origin
        assert_eq!(frozen.states()[0].position_m, Vector3::zeros());
    }

    #[test]
    fn test_heading_follows_filtered_positions() {
        let params = TrajGenParams {
            max_accel_ms2: [0.5, 0.5, 0.5],
            max_speed_ms: [0.3, 0.3, 0.3],
            filter_chain: vec![FilterStage::RateLimit],
            ..Default::default()
        };

        // A square corner, which the rate limiter cuts
        let mut builder = PathSegmentBuilder::new(&params, Vector3::zeros()).unwrap();
        builder.append(&Directive::takeoff(1.0)).unwrap();
        builder.append(&Directive::fly_to([1.0, 0.0, 1.0])).unwrap();
        builder.append(&Directive::fly_to([1.0, 1.0, 1.0])).unwrap();
        let traj = KinematicStateDifferentiator::new(&params).differentiate(builder.finish());

        let raw_yaws: Vec<f64> = traj.states.iter().map(|s| s.yaw_rad).collect();
        let policies = traj.policies.clone();

        let frozen = SmoothingFilter::new(&params).apply(traj);
        let states = frozen.states();

        assert_eq!(states[0].yaw_rad, params.initial_yaw_rad);

        for i in 1..states.len() {
            let d = horizontal(&states[i].position_m) - horizontal(&states[i - 1].position_m);

            let expected = match policies[i] {
                HeadingPolicy::Auto if d.norm() >= heading::HEADING_EPSILON => {
                    wrap_pi(d[1].atan2(d[0]))
                }
                HeadingPolicy::Auto | HeadingPolicy::Still => states[i - 1].yaw_rad,
                _ => unreachable!(),
            };

            assert!((states[i].yaw_rad - expected).abs() < 1e-12);
        }

        // Cutting the corner points the vehicle somewhere the raw path never did
        assert!(states
            .iter()
            .zip(raw_yaws.iter())
            .any(|(s, raw)| (s.yaw_rad - raw).abs() > 0.1));
    }

    #[test]
    fn test_smooth_yaw_across_wrap() {
        // Alternating either side of pi should smooth to pi, not to zero
        let yaws: Vec<f64> = (0..21)
            .map(|i| if i % 2 == 0 { PI - 0.01 } else { -PI + 0.01 })
            .collect();

        for y in smooth_yaw(&yaws, 5) {
            assert!(PI - y.abs() < 0.011);
        }
    }
}
