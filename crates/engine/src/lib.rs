// SPDX-License-Identifier: MIT

//! Watched-root bookkeeping for the vigil daemon.
//!
//! Each watched root carries its own logical tick counter, cursor table,
//! file table, and trigger table, all guarded by the root's lock. The
//! live filesystem watcher is an external collaborator: it feeds observed
//! facts through [`Engine::record_changes`], which advances the root's
//! clock and emits a [`RootEvent`] for the daemon's change pump. Initial
//! population happens with a one-shot recursive scan at watch time.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod query;
pub mod registry;
pub mod root;
mod scan;

pub use query::{parse_query_spec, Query, QueryError, QuerySpec};
pub use registry::{Engine, EngineError, RootEvent};
pub use root::{Change, QueryResults, Root, TriggerDef};

/// Seconds since the epoch, saturating at zero on clock skew.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
