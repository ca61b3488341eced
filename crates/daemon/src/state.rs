// SPDX-License-Identifier: MIT

//! Persisted daemon state: the watched roots and their triggers.
//!
//! Saved on every watch/trigger mutation and loaded at startup, when
//! each persisted root is re-watched (with a fresh scan) and its
//! triggers re-registered. File tables are reconstructible, so nothing
//! else needs to survive a restart.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use vigil_engine::TriggerDef;

use crate::server::Daemon;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub roots: Vec<PersistedRoot>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedRoot {
    pub path: PathBuf,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
}

/// Snapshot the engine's watches and triggers to the state file.
/// Best-effort: a failure is logged, not propagated.
pub fn save(daemon: &Daemon) {
    let state = collect(daemon);
    if let Err(e) = write_state(&daemon.config.state_path, &state) {
        warn!(error = %e, "failed to save state");
    }
}

/// Re-watch persisted roots and re-register their triggers. Roots that
/// no longer resolve are dropped with a warning.
pub fn load(daemon: &Daemon) {
    let path = &daemon.config.state_path;
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(error = %e, "failed to read state file");
            return;
        }
    };

    let state: PersistedState = match serde_json::from_slice(&raw) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "ignoring malformed state file");
            return;
        }
    };

    for persisted in state.roots {
        let name = persisted.path.to_string_lossy();
        match daemon.engine.resolve(&name, true) {
            Ok(root) => {
                for trigger in persisted.triggers {
                    root.add_trigger(trigger);
                }
            }
            Err(e) => {
                warn!(root = %name, error = %e, "dropping unwatchable persisted root");
            }
        }
    }
}

fn collect(daemon: &Daemon) -> PersistedState {
    let roots = daemon
        .engine
        .watch_list()
        .into_iter()
        .filter_map(|path| {
            let root = daemon.engine.get(&path)?;
            Some(PersistedRoot {
                path,
                triggers: root.triggers(),
            })
        })
        .collect();
    PersistedState { roots }
}

/// Write-then-rename so a crash mid-save never leaves a torn file.
fn write_state(path: &Path, state: &PersistedState) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(state).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
