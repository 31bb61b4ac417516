//! # Trajectory properties
//!
//! Randomised checks of the limits and windowing guarantees over generated directive lists.

use nalgebra::Vector3;
use proptest::prelude::*;
use std::f64::consts::PI;

use comms_if::traj::TrajectoryMsg;
use traj_lib::{
    directive::Directive,
    filter::{FilterStage, SavGolSeries},
    generator::TrajectoryGenerator,
    params::TrajGenParams,
    profile::StepMode,
    publisher::{Pacing, Publisher, TrajectorySink},
    shutdown::ShutdownFlag,
};

// ---------------------------------------------------------------------------
// HELPERS
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSink {
    msgs: Vec<TrajectoryMsg>,
}

impl TrajectorySink for RecordingSink {
    type Error = String;

    fn send(&mut self, msg: &TrajectoryMsg) -> Result<(), Self::Error> {
        self.msgs.push(msg.clone());
        Ok(())
    }
}

fn arb_point() -> impl Strategy<Value = [f64; 3]> {
    (-2.0..2.0f64, -2.0..2.0f64, 0.0..2.0f64).prop_map(|(x, y, z)| [x, y, z])
}

fn arb_directive() -> impl Strategy<Value = Directive> {
    prop_oneof![
        (0.0..2.0f64).prop_map(Directive::takeoff),
        (0.0..0.5f64).prop_map(Directive::hover),
        arb_point().prop_map(Directive::fly_to),
        (arb_point(), -1.5..1.5f64).prop_map(|(c, r)| Directive::circle(c, r)),
        (arb_point(), -1.0..1.0f64, 0.0..2.0f64)
            .prop_map(|(c, r, z)| Directive::spiral(c, r, z)),
        (arb_point(), 0.1..2.0f64).prop_map(|(p, v)| Directive::fly_to(p).with_speed(v)),
        Just(Directive::land()),
        Just(Directive::return_home()),
    ]
}

fn arb_step_mode() -> impl Strategy<Value = StepMode> {
    prop_oneof![Just(StepMode::Trapezoidal), Just(StepMode::Linear)]
}

fn filtered_params(step_mode: StepMode) -> TrajGenParams {
    TrajGenParams {
        max_accel_ms2: [1.5, 1.5, 2.0],
        max_speed_ms: [1.0, 1.0, 0.8],
        lead_in_duration_s: 0.2,
        settle_duration_s: 0.2,
        step_mode,
        filter_chain: vec![
            FilterStage::SavGol {
                window: 21,
                order: 1,
                series: SavGolSeries::Velocity,
            },
            FilterStage::SavGol {
                window: 9,
                order: 2,
                series: SavGolSeries::Position,
            },
        ],
        yaw_smoothing_window: Some(21),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// PROPERTIES
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Filtered trajectories never exceed the per-axis limits.
    #[test]
    fn filtered_trajectory_respects_limits(
        directives in prop::collection::vec(arb_directive(), 1..6),
        step_mode in arb_step_mode(),
    ) {
        let params = filtered_params(step_mode);
        let traj = TrajectoryGenerator::new(&params)
            .build(Vector3::zeros(), &directives)
            .unwrap();

        let dt = 1.0 / params.sample_rate_hz;

        for (i, s) in traj.states().iter().enumerate() {
            for axis in 0..3 {
                prop_assert!(s.accel_ms2[axis].abs() <= params.max_accel_ms2[axis]);
                prop_assert!(s.velocity_ms[axis].abs() <= params.max_speed_ms[axis]);
            }
            prop_assert!(s.yaw_rad > -PI && s.yaw_rad <= PI);
            prop_assert!((s.t_s - i as f64 * dt).abs() < 1e-9);
        }
    }

    /// Every window fits the configured size and the last one ends on the last sample.
    #[test]
    fn windows_cover_trajectory(
        directives in prop::collection::vec(arb_directive(), 1..4),
        window_duration_s in 0.01..2.0f64,
        output_rate_hz in 1.0..50.0f64,
    ) {
        let params = TrajGenParams {
            window_duration_s,
            output_rate_hz,
            ..Default::default()
        };
        let traj = TrajectoryGenerator::new(&params)
            .build(Vector3::zeros(), &directives)
            .unwrap();

        let mut sink = RecordingSink::default();
        let mut publisher = Publisher::new(&params, "prop".into(), Pacing::Unpaced);
        publisher.set_origin(Vector3::zeros());
        let report = publisher
            .stream(&traj, &mut sink, &ShutdownFlag::new())
            .unwrap();
        let msgs = sink.msgs;

        prop_assert!(report.completed);
        prop_assert_eq!(msgs.len() as u64, report.num_ticks);

        for msg in msgs.iter() {
            prop_assert!(!msg.points.is_empty());
            prop_assert!(msg.points.len() <= params.window_samples());
        }

        let last_point = &msgs[msgs.len() - 1].points[msgs[msgs.len() - 1].points.len() - 1];
        let last_state = &traj.states()[traj.len() - 1];
        prop_assert_eq!(last_point.time_from_start_s, last_state.t_s);
    }
}
