// SPDX-License-Identifier: MIT

//! Client-facing log broadcast levels.

use std::str::FromStr;

use thiserror::Error;

/// Per-session log threshold, and the level attached to broadcast
/// messages. Ordered by severity: `Debug < Error`. `Off` never receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    Off,
    Debug,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
        }
    }

    /// Whether a session at this threshold receives a message of `level`.
    pub fn receives(self, level: LogLevel) -> bool {
        self != LogLevel::Off && level != LogLevel::Off && self <= level
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(LogLevel::Off),
            "debug" => Ok(LogLevel::Debug),
            "error" => Ok(LogLevel::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "level_tests.rs"]
mod tests;
