//! # Directives
//!
//! A directive is one high level motion instruction. A run is described by an ordered list of
//! directives which are discretised one after the other.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::heading::HeadingPolicy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single motion directive with its speed and heading requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,

    pub speed: SpeedRequest,

    pub heading: HeadingRequest,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The motion a directive asks for.
///
/// In directive scripts the variant is given by the `type` key, for example
/// `{ type = "FlyTo", target_m = [1.0, 0.0, 1.0] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DirectiveKind {
    /// Climb (or descend) vertically to the given altitude.
    Takeoff { z_m: f64 },

    /// Hold the current position for the given duration.
    Hover { duration_s: f64 },

    /// Fly in a straight line to the target.
    FlyTo { target_m: [f64; 3] },

    /// Turn about the center at the current altitude. Negative revolutions turn clockwise.
    Circle { center_m: [f64; 3], revolutions: f64 },

    /// Turn about the center while moving linearly to the target altitude.
    Spiral {
        center_m: [f64; 3],
        revolutions: f64,
        target_z_m: f64,
    },

    /// Descend vertically to the ground.
    Land,

    /// Fly back over the origin then descend to the origin's altitude.
    ReturnHome,
}

/// Speed requested by a directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedRequest {
    /// Cruise speed, or the landing speed for descents.
    Default,

    /// A specific speed in meters per second.
    Custom(f64),
}

/// Heading requested by a directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingRequest {
    /// The configured default heading policy.
    Default,

    /// A specific heading policy.
    Override(HeadingPolicy),
}

/// Reasons a directive is rejected.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DirectiveError {
    #[error("The {0} value is not finite")]
    NotFinite(&'static str),

    #[error("Hover duration must not be negative, got {0} s")]
    NegativeDuration(f64),

    #[error("Custom speed must be positive, got {0} m/s")]
    NonPositiveSpeed(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DirectiveKind {
    /// Name of the kind, matching its `type` tag in directive scripts.
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Takeoff { .. } => "Takeoff",
            DirectiveKind::Hover { .. } => "Hover",
            DirectiveKind::FlyTo { .. } => "FlyTo",
            DirectiveKind::Circle { .. } => "Circle",
            DirectiveKind::Spiral { .. } => "Spiral",
            DirectiveKind::Land => "Land",
            DirectiveKind::ReturnHome => "ReturnHome",
        }
    }

    /// Names of the fields of this kind, as written in directive scripts.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            DirectiveKind::Takeoff { .. } => &["z_m"],
            DirectiveKind::Hover { .. } => &["duration_s"],
            DirectiveKind::FlyTo { .. } => &["target_m"],
            DirectiveKind::Circle { .. } => &["center_m", "revolutions"],
            DirectiveKind::Spiral { .. } => &["center_m", "revolutions", "target_z_m"],
            DirectiveKind::Land | DirectiveKind::ReturnHome => &[],
        }
    }
}

impl Directive {
    /// Create a new directive with the default speed and heading.
    pub fn new(kind: DirectiveKind) -> Self {
        Self {
            kind,
            speed: SpeedRequest::Default,
            heading: HeadingRequest::Default,
        }
    }

    pub fn takeoff(z_m: f64) -> Self {
        Self::new(DirectiveKind::Takeoff { z_m })
    }

    pub fn hover(duration_s: f64) -> Self {
        Self::new(DirectiveKind::Hover { duration_s })
    }

    pub fn fly_to(target_m: [f64; 3]) -> Self {
        Self::new(DirectiveKind::FlyTo { target_m })
    }

    pub fn circle(center_m: [f64; 3], revolutions: f64) -> Self {
        Self::new(DirectiveKind::Circle {
            center_m,
            revolutions,
        })
    }

    pub fn spiral(center_m: [f64; 3], revolutions: f64, target_z_m: f64) -> Self {
        Self::new(DirectiveKind::Spiral {
            center_m,
            revolutions,
            target_z_m,
        })
    }

    pub fn land() -> Self {
        Self::new(DirectiveKind::Land)
    }

    pub fn return_home() -> Self {
        Self::new(DirectiveKind::ReturnHome)
    }

    /// Request a specific speed for this directive.
    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed = SpeedRequest::Custom(speed_ms);
        self
    }

    /// Request a specific heading policy for this directive.
    pub fn with_heading(mut self, policy: HeadingPolicy) -> Self {
        self.heading = HeadingRequest::Override(policy);
        self
    }

    /// Resolve the requested speed against the given default.
    pub fn speed_ms(&self, default_ms: f64) -> f64 {
        match self.speed {
            SpeedRequest::Default => default_ms,
            SpeedRequest::Custom(s) => s,
        }
    }

    /// Resolve the requested heading policy against the given default.
    pub fn heading_policy(&self, default: HeadingPolicy) -> HeadingPolicy {
        match self.heading {
            HeadingRequest::Default => default,
            HeadingRequest::Override(p) => p,
        }
    }

    /// Short name of the directive, used in logs.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Check that the values of the directive can be discretised.
    ///
    /// Degenerate values (zero duration, zero revolutions) are valid, they just produce no
    /// samples.
    pub fn validate(&self) -> Result<(), DirectiveError> {
        match self.kind {
            DirectiveKind::Takeoff { z_m } => check_finite("z_m", &[z_m])?,
            DirectiveKind::Hover { duration_s } => {
                check_finite("duration_s", &[duration_s])?;
                if duration_s < 0.0 {
                    return Err(DirectiveError::NegativeDuration(duration_s));
                }
            }
            DirectiveKind::FlyTo { target_m } => check_finite("target_m", &target_m)?,
            DirectiveKind::Circle {
                center_m,
                revolutions,
            } => {
                check_finite("center_m", &center_m)?;
                check_finite("revolutions", &[revolutions])?;
            }
            DirectiveKind::Spiral {
                center_m,
                revolutions,
                target_z_m,
            } => {
                check_finite("center_m", &center_m)?;
                check_finite("revolutions", &[revolutions])?;
                check_finite("target_z_m", &[target_z_m])?;
            }
            DirectiveKind::Land | DirectiveKind::ReturnHome => (),
        }

        if let SpeedRequest::Custom(s) = self.speed {
            // NaN fails this comparison too
            if !(s > 0.0) || !s.is_finite() {
                return Err(DirectiveError::NonPositiveSpeed(s));
            }
        }

        match self.heading {
            HeadingRequest::Override(HeadingPolicy::TowardPoint(p)) => {
                check_finite("heading point", &p)?
            }
            HeadingRequest::Override(HeadingPolicy::FixedAxis(a)) => {
                check_finite("heading axis", &a)?
            }
            _ => (),
        }

        Ok(())
    }
}

fn check_finite(name: &'static str, values: &[f64]) -> Result<(), DirectiveError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DirectiveError::NotFinite(name))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_presets() {
        let d = Directive::fly_to([1.0, 2.0, 3.0])
            .with_speed(0.5)
            .with_heading(HeadingPolicy::Still);

        assert_eq!(
            d.kind,
            DirectiveKind::FlyTo {
                target_m: [1.0, 2.0, 3.0]
            }
        );
        assert_eq!(d.speed_ms(1.5), 0.5);
        assert_eq!(d.heading_policy(HeadingPolicy::Auto), HeadingPolicy::Still);

        let d = Directive::land();
        assert_eq!(d.speed_ms(0.3), 0.3);
        assert_eq!(d.heading_policy(HeadingPolicy::Auto), HeadingPolicy::Auto);
        assert_eq!(d.name(), "Land");
    }

    #[test]
    fn test_validate() {
        assert!(Directive::hover(0.0).validate().is_ok());
        assert!(Directive::circle([0.0; 3], 0.0).validate().is_ok());

        assert_eq!(
            Directive::hover(-1.0).validate(),
            Err(DirectiveError::NegativeDuration(-1.0))
        );
        assert_eq!(
            Directive::takeoff(f64::NAN).validate(),
            Err(DirectiveError::NotFinite("z_m"))
        );
        assert_eq!(
            Directive::land().with_speed(0.0).validate(),
            Err(DirectiveError::NonPositiveSpeed(0.0))
        );
        assert!(Directive::fly_to([0.0, f64::INFINITY, 0.0])
            .validate()
            .is_err());
    }
}
