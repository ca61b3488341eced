// SPDX-License-Identifier: MIT

//! Logical clock identifiers and client-supplied clock specs.
//!
//! A root's logical time is an unsigned 32-bit tick counter that never
//! decreases within a server incarnation. The textual form
//! `c:<pid>:<ticks>` names an incarnation plus a tick within it; strings
//! prefixed `n:` are client-chosen cursor names resolved against a root's
//! cursor table.

use serde_json::Value;
use thiserror::Error;

/// Prefix for named cursors in clock-spec positions.
pub const CURSOR_PREFIX: &str = "n:";

/// The process id stamped into clock id strings.
pub fn this_pid() -> i32 {
    std::process::id() as i32
}

/// Render the clock id string for a tick value of this incarnation.
pub fn clock_id_string(ticks: u32) -> String {
    format!("c:{}:{}", this_pid(), ticks)
}

/// Parse a `c:<pid>:<ticks>` clock id string.
pub fn parse_clock_id(s: &str) -> Option<(i32, u32)> {
    let rest = s.strip_prefix("c:")?;
    let (pid, ticks) = rest.split_once(':')?;
    Some((pid.parse().ok()?, ticks.parse().ok()?))
}

/// Errors from clock-spec classification and resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("expected a timestamp or clock string")]
    InvalidSpec,

    #[error("cursors are not allowed in this position")]
    CursorNotAllowed,
}

/// A client-supplied "since" reference, classified but not yet resolved
/// against a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockSpec {
    /// Seconds since the epoch.
    Timestamp { seconds: i64 },

    /// A `c:<pid>:<ticks>` reference into a server incarnation.
    ClockId { pid: i32, ticks: u32 },

    /// A named cursor; `name` keeps the `n:` prefix.
    Cursor { name: String },
}

impl ClockSpec {
    /// Classify a wire document value: bare integers are timestamps,
    /// `c:<pid>:<ticks>` strings are clock ids, `n:` strings are cursors.
    /// Anything else is rejected.
    pub fn parse(value: &Value) -> Result<Self, ClockError> {
        if let Some(seconds) = value.as_i64() {
            return Ok(ClockSpec::Timestamp { seconds });
        }

        let Some(s) = value.as_str() else {
            return Err(ClockError::InvalidSpec);
        };

        if s.starts_with(CURSOR_PREFIX) {
            return Ok(ClockSpec::Cursor {
                name: s.to_string(),
            });
        }

        if let Some((pid, ticks)) = parse_clock_id(s) {
            return Ok(ClockSpec::ClockId { pid, ticks });
        }

        Err(ClockError::InvalidSpec)
    }
}

/// A clock spec resolved against a root, ready for query evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSince {
    /// Wall-clock reference, compared against observed seconds.
    Timestamp { seconds: i64 },

    /// Tick reference. `fresh_instance` means the reference predates
    /// anything this server has observed for the root, and all files
    /// should be treated as new.
    Ticks { ticks: u32, fresh_instance: bool },
}

impl ResolvedSince {
    pub fn is_fresh_instance(&self) -> bool {
        matches!(
            self,
            ResolvedSince::Ticks {
                fresh_instance: true,
                ..
            }
        )
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
