// SPDX-License-Identifier: MIT

//! Core types shared by the vigil daemon and its watched-root engine.
//!
//! Everything here is pure data: clock identifiers and client-supplied
//! clock specs, per-file observation records and their wire rendering,
//! and the client log-level lattice. No I/O, no locks.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod file;
pub mod level;

pub use clock::{
    clock_id_string, parse_clock_id, this_pid, ClockError, ClockSpec, ResolvedSince,
    CURSOR_PREFIX,
};
pub use file::{render_file_results, ClockStamp, FileEntry, FileMeta, FileResult};
pub use level::{LogLevel, ParseLevelError};
