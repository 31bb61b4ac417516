//! # Trajectory build tests
//!
//! End to end checks of the build phase on small directive lists.

use nalgebra::Vector3;

use traj_lib::{
    directive::Directive,
    generator::TrajectoryGenerator,
    params::TrajGenParams,
    path_builder::PathSegmentBuilder,
    profile::StepMode,
};

const EPS: f64 = 1e-9;

#[test]
fn test_takeoff_hover_land() {
    let params = TrajGenParams {
        sample_rate_hz: 100.0,
        landing_speed_ms: 0.3,
        ..Default::default()
    };
    let directives = vec![
        Directive::takeoff(1.0),
        Directive::hover(2.0),
        Directive::land(),
    ];

    // Count the samples each directive adds
    let mut builder = PathSegmentBuilder::new(&params, Vector3::zeros()).unwrap();
    let lead_in = builder.len();
    let counts: Vec<usize> = directives
        .iter()
        .map(|d| builder.append(d).unwrap())
        .collect();

    assert_eq!(lead_in, params.lead_in_samples());
    assert_eq!(counts[1], 200);

    let traj = TrajectoryGenerator::new(&params)
        .build(Vector3::zeros(), &directives)
        .unwrap();
    let states = traj.states();

    assert_eq!(
        states.len(),
        lead_in + counts.iter().sum::<usize>() + params.settle_samples()
    );

    // x and y never move
    for s in states {
        assert_eq!(s.position_m[0], 0.0);
        assert_eq!(s.position_m[1], 0.0);
    }

    let takeoff_end = lead_in + counts[0];
    let hover_end = takeoff_end + counts[1];
    let land_end = hover_end + counts[2];

    // Rises monotonically to 1.0
    assert_eq!(states[0].position_m[2], 0.0);
    for i in 1..takeoff_end {
        assert!(states[i].position_m[2] >= states[i - 1].position_m[2]);
    }
    assert_eq!(states[takeoff_end - 1].position_m[2], 1.0);

    // Holds for the hover
    for s in &states[takeoff_end..hover_end] {
        assert_eq!(s.position_m[2], 1.0);
        assert_eq!(s.velocity_ms, Vector3::zeros());
    }

    // Descends monotonically to the ground at the landing speed
    let mut peak_descent_ms: f64 = 0.0;
    for i in hover_end..land_end {
        assert!(states[i].position_m[2] < states[i - 1].position_m[2]);
        peak_descent_ms = peak_descent_ms.max(-states[i].velocity_ms[2]);
    }
    assert!((peak_descent_ms - 0.3).abs() < 1e-6);
    assert_eq!(states[land_end - 1].position_m[2], 0.0);

    // Settles on the ground
    for s in &states[land_end..] {
        assert_eq!(s.position_m, Vector3::zeros());
    }
}

#[test]
fn test_time_steps() {
    let params = TrajGenParams::default();
    let traj = TrajectoryGenerator::new(&params)
        .build(
            Vector3::zeros(),
            &[
                Directive::takeoff(1.0),
                Directive::fly_to([1.0, 1.0, 1.5]),
                Directive::return_home(),
            ],
        )
        .unwrap();

    let dt = 1.0 / params.sample_rate_hz;

    for w in traj.states().windows(2) {
        assert!((w[1].t_s - w[0].t_s - dt).abs() < EPS);
    }
    assert_eq!(traj.states()[0].t_s, 0.0);
}

#[test]
fn test_circle_closes() {
    let params = TrajGenParams::default();
    let center = [0.0, 0.0, 1.0];

    let mut builder = PathSegmentBuilder::new(&params, Vector3::zeros()).unwrap();
    builder.append(&Directive::takeoff(1.0)).unwrap();
    builder.append(&Directive::fly_to([1.0, 0.0, 1.0])).unwrap();
    let start = builder.len();
    let added = builder.append(&Directive::circle(center, 1.0)).unwrap();

    assert!(added > 0);
    assert!((builder.end_state().position_m - Vector3::new(1.0, 0.0, 1.0)).norm() < 1e-6);

    let path = builder.finish();
    for p in &path.positions_m[start..] {
        let radius = (p[0] * p[0] + p[1] * p[1]).sqrt();
        assert!((radius - 1.0).abs() < 1e-9);
        assert_eq!(p[2], 1.0);
    }

    // Positive revolutions turn anticlockwise
    assert!(path.positions_m[start][1] > 0.0);
}

#[test]
fn test_negative_revolutions_turn_clockwise() {
    let params = TrajGenParams::default();

    let mut builder = PathSegmentBuilder::new(&params, Vector3::new(1.0, 0.0, 1.0)).unwrap();
    let start = builder.len();
    builder
        .append(&Directive::circle([0.0, 0.0, 1.0], -0.5))
        .unwrap();

    assert!((builder.end_state().position_m - Vector3::new(-1.0, 0.0, 1.0)).norm() < 1e-6);

    let path = builder.finish();
    assert!(path.positions_m[start][1] < 0.0);
}

#[test]
fn test_linear_fly_to_count() {
    let params = TrajGenParams {
        step_mode: StepMode::Linear,
        cruise_speed_ms: 0.4,
        sample_rate_hz: 100.0,
        ..Default::default()
    };

    let target_m = [0.6, 0.0, 0.8];
    let target = Vector3::from(target_m);
    let mut builder = PathSegmentBuilder::new(&params, Vector3::zeros()).unwrap();
    let added = builder.append(&Directive::fly_to(target_m)).unwrap();

    let step_m = params.cruise_speed_ms / params.sample_rate_hz;

    // One metre at 4 mm per step
    assert_eq!(added, 250);
    assert!((added as f64 * step_m - target.norm()).abs() <= step_m);
    assert_eq!(builder.end_state().position_m, target);

    // Every step is the same length
    let path = builder.finish();
    let lead_in = params.lead_in_samples();
    for w in path.positions_m[lead_in - 1..].windows(2) {
        assert!(((w[1] - w[0]).norm() - target.norm() / added as f64).abs() < EPS);
    }
}

#[test]
fn test_build_is_repeatable() {
    let params = TrajGenParams::default();
    let directives = vec![
        Directive::takeoff(1.5),
        Directive::circle([0.5, 0.0, 1.5], 0.75),
        Directive::spiral([0.5, 0.0, 1.5], 1.0, 2.0),
        Directive::hover(0.5),
        Directive::return_home(),
    ];
    let generator = TrajectoryGenerator::new(&params);
    let origin = Vector3::new(0.0, 0.0, 0.0);

    assert_eq!(
        generator.build(origin, &directives).unwrap(),
        generator.build(origin, &directives).unwrap()
    );
}
