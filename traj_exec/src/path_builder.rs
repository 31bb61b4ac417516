//! # Path segment builder
//!
//! Discretises directives into raw positions at the sample rate. The builder owns the
//! [`EndState`] of the path built so far, every directive starts from it and moves it on.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::{Vector2, Vector3};

use crate::{
    directive::{Directive, DirectiveError, DirectiveKind},
    geometry::{self, MIN_SEGMENT_LENGTH_M},
    heading::HeadingPolicy,
    params::TrajGenParams,
    profile::StepMode,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Circles with fewer revolutions than this are treated as degenerate.
const MIN_REVOLUTIONS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The end of the path built so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndState {
    pub position_m: Vector3<f64>,
}

/// Raw positions and the heading policy of each, before differentiation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPath {
    pub positions_m: Vec<Vector3<f64>>,

    pub policies: Vec<HeadingPolicy>,
}

/// Converts directives into raw positions.
pub struct PathSegmentBuilder<'p> {
    params: &'p TrajGenParams,

    origin_m: Vector3<f64>,

    end: EndState,

    path: RawPath,

    num_directives: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BuildError {
    #[error("Cannot build a trajectory from an empty directive list")]
    EmptyDirectiveList,

    #[error("Directive {index} ({name}) is invalid: {source}")]
    InvalidDirective {
        index: usize,
        name: &'static str,
        source: DirectiveError,
    },

    #[error("The origin {0:?} is not finite")]
    NonFiniteOrigin([f64; 3]),

    #[error("The origin {0:?} lies outside the workspace box")]
    OriginOutsideWorkspace([f64; 3]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'p> PathSegmentBuilder<'p> {
    /// Create a new builder seeded with the origin.
    ///
    /// The origin is held for the lead-in duration (at least one sample) using the default
    /// heading policy, so the origin is always sample 0.
    pub fn new(params: &'p TrajGenParams, origin_m: Vector3<f64>) -> Result<Self, BuildError> {
        let origin_arr = [origin_m[0], origin_m[1], origin_m[2]];

        if origin_arr.iter().any(|v| !v.is_finite()) {
            return Err(BuildError::NonFiniteOrigin(origin_arr));
        }

        if let Some(ref b) = params.workspace_box {
            if !b.contains(&origin_m) {
                return Err(BuildError::OriginOutsideWorkspace(origin_arr));
            }
        }

        let lead_in = params.lead_in_samples();

        Ok(Self {
            params,
            origin_m,
            end: EndState {
                position_m: origin_m,
            },
            path: RawPath {
                positions_m: vec![origin_m; lead_in],
                policies: vec![params.default_heading; lead_in],
            },
            num_directives: 0,
        })
    }

    /// The end of the path built so far.
    pub fn end_state(&self) -> &EndState {
        &self.end
    }

    /// Number of raw samples built so far, including the lead-in.
    pub fn len(&self) -> usize {
        self.path.positions_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.positions_m.is_empty()
    }

    /// Discretise one directive onto the end of the path, returning the number of samples added.
    ///
    /// Degenerate directives add no samples and are not an error.
    pub fn append(&mut self, directive: &Directive) -> Result<usize, BuildError> {
        let index = self.num_directives;

        directive
            .validate()
            .map_err(|source| BuildError::InvalidDirective {
                index,
                name: directive.name(),
                source,
            })?;

        let policy = directive.heading_policy(self.params.default_heading);
        let cruise_ms = directive.speed_ms(self.params.cruise_speed_ms);
        let landing_ms = directive.speed_ms(self.params.landing_speed_ms);
        let len_before = self.len();

        match directive.kind {
            DirectiveKind::Takeoff { z_m } => self.vertical(z_m, cruise_ms, policy),
            DirectiveKind::Hover { duration_s } => self.hover(duration_s, policy),
            DirectiveKind::FlyTo { target_m } => {
                self.line(Vector3::from(target_m), cruise_ms, policy)
            }
            DirectiveKind::Circle {
                center_m,
                revolutions,
            } => self.circle(center_m, revolutions, None, cruise_ms, policy),
            DirectiveKind::Spiral {
                center_m,
                revolutions,
                target_z_m,
            } => self.circle(center_m, revolutions, Some(target_z_m), cruise_ms, policy),
            DirectiveKind::Land => self.vertical(self.params.ground_offset_m, landing_ms, policy),
            DirectiveKind::ReturnHome => {
                let current_z = self.end.position_m[2];
                self.line(
                    Vector3::new(self.origin_m[0], self.origin_m[1], current_z),
                    cruise_ms,
                    policy,
                );
                self.vertical(self.origin_m[2], landing_ms, policy);
            }
        }

        self.num_directives += 1;

        let added = self.len() - len_before;
        if added == 0 {
            debug!(
                "Directive {} ({}) is degenerate, no samples added",
                index,
                directive.name()
            );
        } else {
            debug!(
                "Directive {} ({}) added {} samples",
                index,
                directive.name(),
                added
            );
        }

        Ok(added)
    }

    /// Finish building, clamping the path into the workspace box if one is set.
    pub fn finish(self) -> RawPath {
        let mut path = self.path;

        if let Some(ref b) = self.params.workspace_box {
            let mut num_clamped = 0;

            for p in path.positions_m.iter_mut() {
                if !b.contains(p) {
                    *p = b.clamp(p);
                    num_clamped += 1;
                }
            }

            if num_clamped > 0 {
                debug!("{} samples clamped into the workspace box", num_clamped);
            }
        }

        path
    }

    // ---- SEGMENTS ----

    fn push(&mut self, position_m: Vector3<f64>, policy: HeadingPolicy) {
        self.path.positions_m.push(position_m);
        self.path.policies.push(policy);
        self.end.position_m = position_m;
    }

    /// Straight line from the end of the path to the target.
    fn line(&mut self, target_m: Vector3<f64>, speed_ms: f64, policy: HeadingPolicy) {
        let start_m = self.end.position_m;
        let delta = target_m - start_m;
        let distance_m = delta.norm();

        if distance_m < MIN_SEGMENT_LENGTH_M {
            return;
        }

        // Scale the limits so that no single axis exceeds its own
        let (speed_limit_ms, accel_limit_ms2) = match (
            geometry::project_limits(&delta, &self.params.max_speed_ms),
            geometry::project_limits(&delta, &self.params.max_accel_ms2),
        ) {
            (Some(v), Some(a)) => (v, a),
            _ => return,
        };

        let unit = delta / distance_m;
        let profile = self.params.step_mode.profile(
            distance_m,
            speed_ms.min(speed_limit_ms),
            accel_limit_ms2,
            self.params.sample_rate_hz,
        );

        let num_steps = profile.len();
        for (k, s) in profile.into_iter().enumerate() {
            if k + 1 == num_steps {
                self.push(target_m, policy);
            } else {
                self.push(start_m + unit * s, policy);
            }
        }
    }

    /// Vertical move to the given altitude.
    fn vertical(&mut self, z_m: f64, speed_ms: f64, policy: HeadingPolicy) {
        let mut target_m = self.end.position_m;
        target_m[2] = z_m;
        self.line(target_m, speed_ms, policy);
    }

    fn hover(&mut self, duration_s: f64, policy: HeadingPolicy) {
        let num_samples = (duration_s * self.params.sample_rate_hz).round() as usize;
        let position_m = self.end.position_m;

        for _ in 0..num_samples {
            self.push(position_m, policy);
        }
    }

    /// Circle (or spiral, if `target_z_m` is set) about the center.
    ///
    /// Positions are produced by rotating the initial radius vector step by step rather than by
    /// evaluating absolute angles.
    fn circle(
        &mut self,
        center_m: [f64; 3],
        revolutions: f64,
        target_z_m: Option<f64>,
        speed_ms: f64,
        policy: HeadingPolicy,
    ) {
        let start_m = self.end.position_m;
        let center_xy = Vector2::new(center_m[0], center_m[1]);
        let mut radius_vec = geometry::horizontal(&start_m) - center_xy;
        let radius_m = radius_vec.norm();

        if radius_m < MIN_SEGMENT_LENGTH_M || revolutions.abs() < MIN_REVOLUTIONS {
            // A spiral with no horizontal part still has to reach its altitude
            if let Some(z_m) = target_z_m {
                self.vertical(z_m, speed_ms, policy);
            }
            return;
        }

        let arc_m = geometry::arc_length(radius_m, revolutions);
        let dz_m = target_z_m.map(|z| z - start_m[2]).unwrap_or(0.0);

        // Tangential budget, with the speed capped so the centripetal acceleration stays inside
        // the same budget
        let accel_h_ms2 = geometry::circle_accel_limit(&self.params.max_accel_ms2);
        let mut speed_ms = speed_ms
            .min(self.params.max_speed_ms[0].min(self.params.max_speed_ms[1]))
            .min((accel_h_ms2 * radius_m).sqrt());
        let mut accel_ms2 = accel_h_ms2;

        // Keep the vertical component of a spiral within the z limits
        if dz_m.abs() > MIN_SEGMENT_LENGTH_M {
            let ratio = arc_m / dz_m.abs();
            speed_ms = speed_ms.min(self.params.max_speed_ms[2] * ratio);
            accel_ms2 = accel_ms2.min(self.params.max_accel_ms2[2] * ratio);
        }

        let profile = self.params.step_mode.profile(
            arc_m,
            speed_ms,
            accel_ms2,
            self.params.sample_rate_hz,
        );

        if profile.is_empty() {
            return;
        }

        let sign = revolutions.signum();
        let z_at = |s: f64| start_m[2] + dz_m * s / arc_m;

        match self.params.step_mode {
            StepMode::Linear => {
                // Every step is the same length so a single rotation is reused
                let step_angle_rad = sign * (arc_m / profile.len() as f64) / radius_m;
                let (sin, cos) = step_angle_rad.sin_cos();

                for s in profile {
                    radius_vec = geometry::rotate(&radius_vec, cos, sin);
                    let xy = center_xy + radius_vec;
                    self.push(Vector3::new(xy[0], xy[1], z_at(s)), policy);
                }
            }
            StepMode::Trapezoidal => {
                let mut prev_s = 0.0;

                for s in profile {
                    let step_angle_rad = sign * (s - prev_s) / radius_m;
                    let (sin, cos) = step_angle_rad.sin_cos();
                    radius_vec = geometry::rotate(&radius_vec, cos, sin);
                    prev_s = s;

                    let xy = center_xy + radius_vec;
                    self.push(Vector3::new(xy[0], xy[1], z_at(s)), policy);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
