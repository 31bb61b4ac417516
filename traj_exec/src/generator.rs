//! # Trajectory generator
//!
//! Runs the build phase: directives are discretised into raw positions, differentiated, then
//! filtered, producing the single [`FrozenTrajectory`] of the run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use nalgebra::Vector3;
use serde::Serialize;

use crate::{
    differentiator::KinematicStateDifferentiator,
    directive::Directive,
    filter::SmoothingFilter,
    params::TrajGenParams,
    path_builder::{BuildError, PathSegmentBuilder},
    state::{FrozenTrajectory, TrajectoryStage},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Builds trajectories from directive lists.
pub struct TrajectoryGenerator<'p> {
    params: &'p TrajGenParams,
}

/// Summary of a built trajectory, archived alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub num_directives: usize,

    pub num_samples: usize,

    pub duration_s: f64,

    pub stage: TrajectoryStage,

    pub origin_m: [f64; 3],

    pub peak_speed_ms: [f64; 3],

    pub peak_accel_ms2: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'p> TrajectoryGenerator<'p> {
    pub fn new(params: &'p TrajGenParams) -> Self {
        Self { params }
    }

    /// Build the trajectory starting at the origin.
    pub fn build(
        &self,
        origin_m: Vector3<f64>,
        directives: &[Directive],
    ) -> Result<FrozenTrajectory, BuildError> {
        if directives.is_empty() {
            return Err(BuildError::EmptyDirectiveList);
        }

        info!(
            "Building trajectory from {} directives, origin at [{:.3}, {:.3}, {:.3}]",
            directives.len(),
            origin_m[0],
            origin_m[1],
            origin_m[2]
        );

        // ---- DISCRETISE ----

        let mut builder = PathSegmentBuilder::new(self.params, origin_m)?;

        for directive in directives.iter() {
            builder.append(directive)?;
        }

        let raw = builder.finish();
        info!("Path discretised into {} raw samples", raw.positions_m.len());

        // ---- DIFFERENTIATE ----

        let traj = KinematicStateDifferentiator::new(self.params).differentiate(raw);
        info!("States differentiated ({} samples)", traj.len());

        // ---- FILTER ----

        let frozen = SmoothingFilter::new(self.params).apply(traj);

        info!(
            "Trajectory frozen as {:?}: {} samples over {:.2} s",
            frozen.stage(),
            frozen.len(),
            frozen.duration_s()
        );

        Ok(frozen)
    }
}

impl BuildSummary {
    pub fn new(frozen: &FrozenTrajectory, origin_m: Vector3<f64>, num_directives: usize) -> Self {
        let (peak_speed_ms, peak_accel_ms2) = frozen.peak_magnitudes();

        Self {
            num_directives,
            num_samples: frozen.len(),
            duration_s: frozen.duration_s(),
            stage: frozen.stage(),
            origin_m: [origin_m[0], origin_m[1], origin_m[2]],
            peak_speed_ms,
            peak_accel_ms2,
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
    fn test_empty_directive_list() {
        let params = TrajGenParams::default();

        assert_eq!(
            TrajectoryGenerator::new(&params)
                .build(Vector3::zeros(), &[])
                .err(),
            Some(BuildError::EmptyDirectiveList)
        );
    }

    #[test]
    fn test_build_and_summarise() {
        let params = TrajGenParams::default();
        let directives = vec![Directive::takeoff(1.0), Directive::land()];

        let frozen = TrajectoryGenerator::new(&params)
            .build(Vector3::zeros(), &directives)
            .unwrap();

        let summary = BuildSummary::new(&frozen, Vector3::zeros(), directives.len());

        assert_eq!(summary.num_samples, frozen.len());
        assert_eq!(summary.stage, TrajectoryStage::Unfiltered);
        assert_eq!(summary.num_directives, 2);
        assert!(summary.peak_speed_ms[2] <= params.cruise_speed_ms + 1e-9);
    }
}
