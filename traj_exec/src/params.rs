//! Trajectory generation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use crate::{filter::FilterStage, heading::HeadingPolicy, profile::StepMode};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation, loaded from `traj_gen.toml`.
///
/// Per-axis arrays are ordered `[x, y, z]`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TrajGenParams {
    /// Rate at which trajectory windows are published
    pub output_rate_hz: f64,

    /// Rate at which the trajectory is sampled
    pub sample_rate_hz: f64,

    /// Speed used by directives which don't request one
    pub cruise_speed_ms: f64,

    /// Speed used by descents (land and the final leg of return home)
    pub landing_speed_ms: f64,

    /// Altitude which a land directive descends to
    #[serde(default)]
    pub ground_offset_m: f64,

    /// Maximum acceleration per axis
    pub max_accel_ms2: [f64; 3],

    /// Maximum speed per axis
    pub max_speed_ms: [f64; 3],

    /// Duration of trajectory published in each window
    pub window_duration_s: f64,

    /// Duration the origin is held for before the first directive
    pub lead_in_duration_s: f64,

    /// Duration the final position is held for after the last directive
    pub settle_duration_s: f64,

    /// Yaw of the first sample
    #[serde(default)]
    pub initial_yaw_rad: f64,

    /// Box that positions are clamped into, if any
    #[serde(default)]
    pub workspace_box: Option<WorkspaceBox>,

    /// Heading policy of directives which don't request one
    #[serde(default)]
    pub default_heading: HeadingPolicy,

    /// Step sizing strategy
    #[serde(default)]
    pub step_mode: StepMode,

    /// Smoothing and saturation stages, applied in order
    #[serde(default)]
    pub filter_chain: Vec<FilterStage>,

    /// Window of the yaw smoothing pass run after filtering, if any
    #[serde(default)]
    pub yaw_smoothing_window: Option<usize>,
}

/// An axis aligned box which the trajectory must stay inside.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceBox {
    pub min_m: [f64; 3],

    pub max_m: [f64; 3],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The {0} parameter must be positive and finite, got {1}")]
    NotPositive(&'static str, f64),

    #[error("The {0} parameter must not be negative, got {1}")]
    Negative(&'static str, f64),

    #[error("The {0} parameter must be finite")]
    NotFinite(&'static str),

    #[error("The workspace box minimum must not exceed its maximum on any axis")]
    InvalidWorkspaceBox,

    #[error("Savitzky-Golay windows must be odd, got {0}")]
    EvenWindow(usize),

    #[error("Savitzky-Golay order ({order}) must be less than the window ({window})")]
    OrderTooHigh { order: usize, window: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajGenParams {
    /// Check the parameters describe a usable configuration.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_positive("output_rate_hz", self.output_rate_hz)?;
        check_positive("sample_rate_hz", self.sample_rate_hz)?;
        check_positive("cruise_speed_ms", self.cruise_speed_ms)?;
        check_positive("landing_speed_ms", self.landing_speed_ms)?;
        check_positive("window_duration_s", self.window_duration_s)?;

        for i in 0..3 {
            check_positive("max_accel_ms2", self.max_accel_ms2[i])?;
            check_positive("max_speed_ms", self.max_speed_ms[i])?;
        }

        check_non_negative("lead_in_duration_s", self.lead_in_duration_s)?;
        check_non_negative("settle_duration_s", self.settle_duration_s)?;

        if !self.ground_offset_m.is_finite() {
            return Err(ParamsError::NotFinite("ground_offset_m"));
        }
        if !self.initial_yaw_rad.is_finite() {
            return Err(ParamsError::NotFinite("initial_yaw_rad"));
        }

        if let Some(ref b) = self.workspace_box {
            if b.min_m.iter().chain(b.max_m.iter()).any(|v| !v.is_finite()) {
                return Err(ParamsError::NotFinite("workspace_box"));
            }
            if (0..3).any(|i| b.min_m[i] > b.max_m[i]) {
                return Err(ParamsError::InvalidWorkspaceBox);
            }
        }

        for stage in self.filter_chain.iter() {
            if let FilterStage::SavGol { window, order, .. } = *stage {
                check_window(window, order)?;
            }
        }

        if let Some(window) = self.yaw_smoothing_window {
            check_window(window, 1)?;
        }

        Ok(())
    }

    /// Number of samples per lead-in, always at least one so that the origin is sample 0.
    pub fn lead_in_samples(&self) -> usize {
        ((self.lead_in_duration_s * self.sample_rate_hz).round() as usize).max(1)
    }

    /// Number of samples held at the end of the path.
    pub fn settle_samples(&self) -> usize {
        (self.settle_duration_s * self.sample_rate_hz).round() as usize
    }

    /// Number of samples in each published window.
    pub fn window_samples(&self) -> usize {
        ((self.window_duration_s * self.sample_rate_hz).round() as usize).max(1)
    }

    /// Number of samples the window advances by on each publish tick.
    pub fn output_step_samples(&self) -> usize {
        ((self.sample_rate_hz / self.output_rate_hz).round() as usize).max(1)
    }
}

impl WorkspaceBox {
    /// Return true if the position lies inside the box (boundary included).
    pub fn contains(&self, position_m: &Vector3<f64>) -> bool {
        (0..3).all(|i| position_m[i] >= self.min_m[i] && position_m[i] <= self.max_m[i])
    }

    /// Clamp the position into the box.
    pub fn clamp(&self, position_m: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            util::maths::clamp(position_m[0], self.min_m[0], self.max_m[0]),
            util::maths::clamp(position_m[1], self.min_m[1], self.max_m[1]),
            util::maths::clamp(position_m[2], self.min_m[2], self.max_m[2]),
        )
    }
}

impl Default for TrajGenParams {
    /// Unfiltered defaults, without a workspace box.
    fn default() -> Self {
        Self {
            output_rate_hz: 10.0,
            sample_rate_hz: 100.0,
            cruise_speed_ms: 0.4,
            landing_speed_ms: 0.3,
            ground_offset_m: 0.0,
            max_accel_ms2: [2.5, 2.5, 3.0],
            max_speed_ms: [10.0, 10.0, 12.0],
            window_duration_s: 0.5,
            lead_in_duration_s: 1.0,
            settle_duration_s: 1.0,
            initial_yaw_rad: 0.0,
            workspace_box: None,
            default_heading: HeadingPolicy::Auto,
            step_mode: StepMode::Trapezoidal,
            filter_chain: Vec::new(),
            yaw_smoothing_window: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive(name, value))
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if !value.is_finite() {
        Err(ParamsError::NotFinite(name))
    } else if value < 0.0 {
        Err(ParamsError::Negative(name, value))
    } else {
        Ok(())
    }
}

fn check_window(window: usize, order: usize) -> Result<(), ParamsError> {
    if window % 2 == 0 {
        return Err(ParamsError::EvenWindow(window));
    }
    if order >= window {
        return Err(ParamsError::OrderTooHigh { order, window });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::filter::SavGolSeries;

    const PARAMS_TOML: &str = r#"
        output_rate_hz = 10.0
        sample_rate_hz = 100.0
        cruise_speed_ms = 0.4
        landing_speed_ms = 0.3
        max_accel_ms2 = [2.5, 2.5, 3.0]
        max_speed_ms = [10.0, 10.0, 12.0]
        window_duration_s = 0.5
        lead_in_duration_s = 1.0
        settle_duration_s = 1.0
        default_heading = { TowardPoint = [1.0, 2.0] }
        step_mode = "Linear"
        yaw_smoothing_window = 53

        [workspace_box]
        min_m = [-2.0, -1.0, -0.01]
        max_m = [2.0, 3.0, 2.0]

        [[filter_chain]]
        type = "SavGol"
        window = 53
        order = 1

        [[filter_chain]]
        type = "RateLimit"
    "#;

    #[test]
    fn test_load_from_toml() {
        let params: TrajGenParams = util::params::from_toml_str(PARAMS_TOML).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.step_mode, StepMode::Linear);
        assert_eq!(params.default_heading, HeadingPolicy::TowardPoint([1.0, 2.0]));
        assert_eq!(
            params.filter_chain,
            vec![
                FilterStage::SavGol {
                    window: 53,
                    order: 1,
                    series: SavGolSeries::Velocity
                },
                FilterStage::RateLimit
            ]
        );
        assert_eq!(params.ground_offset_m, 0.0);
        assert_eq!(params.window_samples(), 50);
        assert_eq!(params.output_step_samples(), 10);
        assert_eq!(params.lead_in_samples(), 100);
    }

    #[test]
    fn test_shipped_params_are_valid() {
        let params: TrajGenParams =
            util::params::from_toml_str(include_str!("../../params/traj_gen.toml")).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.filter_chain.len(), 2);
        assert!(params.workspace_box.is_some());
    }

    #[test]
    fn test_validate() {
        let mut params = TrajGenParams::default();
        assert!(params.validate().is_ok());

        params.sample_rate_hz = 0.0;
        assert_eq!(
            params.validate(),
            Err(ParamsError::NotPositive("sample_rate_hz", 0.0))
        );

        let mut params = TrajGenParams::default();
        params.filter_chain = vec![FilterStage::SavGol {
            window: 4,
            order: 1,
            series: SavGolSeries::Velocity,
        }];
        assert_eq!(params.validate(), Err(ParamsError::EvenWindow(4)));

        let mut params = TrajGenParams::default();
        params.filter_chain = vec![FilterStage::SavGol {
            window: 3,
            order: 3,
            series: SavGolSeries::Position,
        }];
        assert_eq!(
            params.validate(),
            Err(ParamsError::OrderTooHigh {
                order: 3,
                window: 3
            })
        );

        let mut params = TrajGenParams::default();
        params.workspace_box = Some(WorkspaceBox {
            min_m: [0.0, 0.0, 1.0],
            max_m: [1.0, 1.0, 0.0],
        });
        assert_eq!(params.validate(), Err(ParamsError::InvalidWorkspaceBox));
    }

    #[test]
    fn test_workspace_box() {
        let b = WorkspaceBox {
            min_m: [-1.0, -1.0, 0.0],
            max_m: [1.0, 1.0, 2.0],
        };

        assert!(b.contains(&Vector3::new(0.0, 1.0, 0.0)));
        assert!(!b.contains(&Vector3::new(0.0, 1.5, 0.0)));
        assert_eq!(
            b.clamp(&Vector3::new(3.0, -3.0, 1.0)),
            Vector3::new(1.0, -1.0, 1.0)
        );
    }
}
