//! Host platform (linux for example) utility functions

use std::{env, path::PathBuf};

/// Environment variable holding the root of the software tree, under which
/// the `params` and `sessions` directories are found.
pub const SW_ROOT_ENV_VAR: &str = "LANE_SW_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the root directory of the software tree from the environment.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
