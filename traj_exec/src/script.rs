//! # Directive scripts
//!
//! Directive scripts are TOML files listing the directives of a run in order:
//!
//! ```toml
//! [[directive]]
//! type = "Takeoff"
//! z_m = 1.0
//!
//! [[directive]]
//! type = "FlyTo"
//! target_m = [1.0, 0.0, 1.0]
//! speed_ms = 0.5
//! heading = { FixedAxis = [1.0, 0.0] }
//!
//! [[directive]]
//! type = "Land"
//! ```
//!
//! `speed_ms` and `heading` are optional on every directive. Any other key which isn't a field of
//! the directive's type is an error.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{de::IgnoredAny, Deserialize};
use std::{collections::BTreeMap, path::Path};

use util::params::{self, LoadError};

use crate::{
    directive::{Directive, DirectiveKind, HeadingRequest, SpeedRequest},
    heading::HeadingPolicy,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Key holding the directive type.
const TYPE_KEY: &str = "type";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Script {
    #[serde(default)]
    directive: Vec<ScriptEntry>,
}

#[derive(Deserialize)]
struct ScriptEntry {
    #[serde(flatten)]
    kind: DirectiveKind,

    #[serde(default)]
    speed_ms: Option<f64>,

    #[serde(default)]
    heading: Option<HeadingPolicy>,

    /// Every key left over once `speed_ms` and `heading` are taken, including the kind's own
    #[serde(flatten)]
    keys: BTreeMap<String, IgnoredAny>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Could not load the directive script: {0}")]
    LoadError(LoadError),

    #[error("Directive {index} ({name}) has an unknown key \"{key}\"")]
    UnknownKey {
        index: usize,
        name: &'static str,
        key: String,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptEntry {
    /// Return the first key which is neither the type tag nor a field of the directive.
    fn unknown_key(&self) -> Option<&str> {
        let fields = self.kind.field_names();

        self.keys
            .keys()
            .map(|k| k.as_str())
            .find(|k| *k != TYPE_KEY && !fields.contains(k))
    }
}

impl From<ScriptEntry> for Directive {
    fn from(entry: ScriptEntry) -> Self {
        Directive {
            kind: entry.kind,
            speed: match entry.speed_ms {
                Some(s) => SpeedRequest::Custom(s),
                None => SpeedRequest::Default,
            },
            heading: match entry.heading {
                Some(h) => HeadingRequest::Override(h),
                None => HeadingRequest::Default,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load the directives of a script file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Directive>, ScriptError> {
    let script: Script = params::load_file(path).map_err(ScriptError::LoadError)?;

    into_directives(script)
}

/// Parse the directives of a script held in a string.
pub fn from_str(script_str: &str) -> Result<Vec<Directive>, ScriptError> {
    let script: Script = params::from_toml_str(script_str).map_err(ScriptError::LoadError)?;

    into_directives(script)
}

fn into_directives(script: Script) -> Result<Vec<Directive>, ScriptError> {
    script
        .directive
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry.unknown_key().map(String::from) {
            Some(key) => Err(ScriptError::UnknownKey {
                index,
                name: entry.kind.name(),
                key,
            }),
            None => Ok(Directive::from(entry)),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_script() {
        let directives = from_str(
            r#"
            [[directive]]
            type = "Takeoff"
            z_m = 1.0

            [[directive]]
            type = "Hover"
            duration_s = 2.0
            heading = "Still"

            [[directive]]
            type = "FlyTo"
            target_m = [1.0, 0.0, 1.0]
            speed_ms = 0.5
            heading = { FixedAxis = [1.0, 0.0] }

            [[directive]]
            type = "Circle"
            center_m = [0.0, 0.0, 1.0]
            revolutions = -1.5
            heading = { TowardPoint = [0.0, 0.0] }

            [[directive]]
            type = "Spiral"
            center_m = [0.0, 0.0, 1.0]
            revolutions = 1.0
            target_z_m = 1.5

            [[directive]]
            type = "ReturnHome"

            [[directive]]
            type = "Land"
            "#,
        )
        .unwrap();

        assert_eq!(
            directives,
            vec![
                Directive::takeoff(1.0),
                Directive::hover(2.0).with_heading(HeadingPolicy::Still),
                Directive::fly_to([1.0, 0.0, 1.0])
                    .with_speed(0.5)
                    .with_heading(HeadingPolicy::FixedAxis([1.0, 0.0])),
                Directive::circle([0.0, 0.0, 1.0], -1.5)
                    .with_heading(HeadingPolicy::TowardPoint([0.0, 0.0])),
                Directive::spiral([0.0, 0.0, 1.0], 1.0, 1.5),
                Directive::return_home(),
                Directive::land(),
            ]
        );
    }

    #[test]
    fn test_unknown_directive() {
        let result = from_str(
            r#"
            [[directive]]
            type = "Loop"
            radius_m = 1.0
            "#,
        );

        assert!(matches!(result, Err(ScriptError::LoadError(LoadError::DeserialiseError(_)))));
    }

    #[test]
    fn test_misspelled_keys() {
        let result = from_str(
            r#"
            [[directive]]
            type = "Takeoff"
            z_m = 1.0

            [[directive]]
            type = "FlyTo"
            target_m = [1.0, 0.0, 1.0]
            speed = 5.0
            headng = "Still"
            "#,
        );

        match result {
            Err(ScriptError::UnknownKey { index, name, key }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "FlyTo");
                assert_eq!(key, "headng");
            }
            other => panic!("Expected an unknown key error, got {:?}", other),
        }

        // A field of another directive type is unknown too
        let result = from_str(
            r#"
            [[directive]]
            type = "Land"
            z_m = 0.5
            "#,
        );
        assert!(matches!(result, Err(ScriptError::UnknownKey { .. })));
    }

    #[test]
    fn test_empty_script() {
        assert!(from_str("").unwrap().is_empty());
    }
}
