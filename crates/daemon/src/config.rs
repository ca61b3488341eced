// SPDX-License-Identifier: MIT

//! Daemon configuration: the state directory and the paths derived
//! beneath it. Commands are delivered on the socket; there are no
//! configuration flags.

use std::path::PathBuf;

use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory (set VIGIL_STATE_DIR or HOME)")]
    NoStateDir,
}

/// Paths the daemon operates on, all rooted in the state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub log_path: PathBuf,
    pub lock_path: PathBuf,
    pub state_path: PathBuf,
}

impl Config {
    /// Load configuration from the ambient environment.
    pub fn load() -> Result<Config, ConfigError> {
        Ok(Config::for_state_dir(env::state_dir()?))
    }

    /// Build a configuration rooted at an explicit state directory.
    pub fn for_state_dir(state_dir: PathBuf) -> Config {
        Config {
            socket_path: state_dir.join("vigild.sock"),
            log_path: state_dir.join("vigild.log"),
            lock_path: state_dir.join("vigild.lock"),
            state_path: state_dir.join("state.json"),
            state_dir,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
