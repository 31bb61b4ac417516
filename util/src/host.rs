//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "TRAJ_GEN_SW_ROOT";

/// Get the software root directory from the `TRAJ_GEN_SW_ROOT` environment variable.
///
/// The parameter files and the sessions directory are both resolved relative to this root.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
