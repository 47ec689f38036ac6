//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
///
/// The root is expected to contain the `params` directory, and will contain
/// the `sessions` directory once an executable has been run.
pub const SW_ROOT_ENV_VAR: &str = "WALK_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
