// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Resolve state directory: VIGIL_STATE_DIR > XDG_STATE_HOME/vigil > ~/.local/state/vigil
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("VIGIL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("vigil"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/vigil"))
}
