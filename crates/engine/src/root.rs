// SPDX-License-Identifier: MIT

//! A single watched root: tick counter, cursor table, file table,
//! trigger table, all under the root's own lock.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use vigil_core::{
    clock_id_string, this_pid, ClockError, ClockSpec, ClockStamp, FileEntry, FileMeta,
    FileResult, ResolvedSince,
};

use crate::query::Query;

/// An observed filesystem fact handed to [`crate::Engine::record_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// File created or modified, with fresh metadata.
    Updated { name: String, meta: FileMeta },

    /// File removed.
    Removed { name: String },
}

/// A registered trigger: spawn `command` (with matched names appended)
/// whenever files matching `patterns` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub name: String,
    pub patterns: Vec<String>,
    pub command: Vec<String>,
}

struct TriggerState {
    def: TriggerDef,
    /// Root tick up to which this trigger has already fired.
    last_ticks: u32,
}

#[derive(Default)]
struct RootState {
    ticks: u32,
    cursors: HashMap<String, u32>,
    files: BTreeMap<String, FileEntry>,
    triggers: BTreeMap<String, TriggerState>,
}

/// A watched directory tree.
pub struct Root {
    path: PathBuf,
    state: Mutex<RootState>,
}

impl Root {
    /// Build a root from an initial scan. Every scanned file is stamped
    /// with the root's first tick.
    pub(crate) fn from_scan(path: PathBuf, scanned: Vec<(String, FileMeta)>, now: i64) -> Self {
        let mut state = RootState {
            ticks: 1,
            ..RootState::default()
        };
        let stamp = ClockStamp {
            ticks: 1,
            seconds: now,
        };
        for (name, meta) in scanned {
            state.files.insert(
                name,
                FileEntry {
                    exists: true,
                    meta,
                    otime: stamp,
                    created: stamp,
                },
            );
        }
        Root {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ticks(&self) -> u32 {
        self.state.lock().ticks
    }

    /// Render the current clock id string for this root.
    pub fn current_clock(&self) -> String {
        clock_id_string(self.state.lock().ticks)
    }

    /// Add `"clock"` with the current clock id to a response document.
    pub fn annotate_with_clock(&self, response: &mut Value) {
        if let Some(obj) = response.as_object_mut() {
            obj.insert("clock".into(), Value::from(self.current_clock()));
        }
    }

    /// Resolve a classified clock spec against this root.
    ///
    /// Cursor lookups bump the tick and store the new value against the
    /// cursor, so that repeated queries through the same cursor return an
    /// empty set until something actually changes. A clock id naming the
    /// current tick forces a bump for the same reason. A clock id from a
    /// different incarnation resolves fresh at tick zero.
    pub fn resolve_since(
        &self,
        spec: &ClockSpec,
        allow_cursor: bool,
    ) -> Result<ResolvedSince, ClockError> {
        match spec {
            ClockSpec::Timestamp { seconds } => Ok(ResolvedSince::Timestamp { seconds: *seconds }),

            ClockSpec::Cursor { name } => {
                if !allow_cursor {
                    return Err(ClockError::CursorNotAllowed);
                }
                let mut state = self.state.lock();
                let (ticks, fresh_instance) = match state.cursors.get(name) {
                    Some(prior) => (*prior, false),
                    None => (0, true),
                };
                state.ticks += 1;
                let bumped = state.ticks;
                state.cursors.insert(name.clone(), bumped);
                debug!(cursor = %name, ticks, "resolved cursor");
                Ok(ResolvedSince::Ticks {
                    ticks,
                    fresh_instance,
                })
            }

            ClockSpec::ClockId { pid, ticks } => {
                if *pid != this_pid() {
                    // They asked a different incarnation of the server;
                    // treat them as having never spoken to us before.
                    return Ok(ResolvedSince::Ticks {
                        ticks: 0,
                        fresh_instance: true,
                    });
                }
                let mut state = self.state.lock();
                if *ticks == state.ticks {
                    state.ticks += 1;
                }
                Ok(ResolvedSince::Ticks {
                    ticks: *ticks,
                    fresh_instance: false,
                })
            }
        }
    }

    /// Apply a batch of observed changes, advancing the clock once.
    /// Returns the tick the batch was stamped with.
    pub(crate) fn apply_changes(&self, changes: &[Change], now: i64) -> u32 {
        let mut state = self.state.lock();
        state.ticks += 1;
        let stamp = ClockStamp {
            ticks: state.ticks,
            seconds: now,
        };

        for change in changes {
            match change {
                Change::Updated { name, meta } => {
                    state
                        .files
                        .entry(name.clone())
                        .and_modify(|entry| {
                            entry.exists = true;
                            entry.meta = *meta;
                            entry.otime = stamp;
                        })
                        .or_insert_with(|| FileEntry {
                            exists: true,
                            meta: *meta,
                            otime: stamp,
                            created: stamp,
                        });
                }
                Change::Removed { name } => {
                    // Keep a tombstone so "since" queries report the removal.
                    if let Some(entry) = state.files.get_mut(name) {
                        entry.exists = false;
                        entry.otime = stamp;
                    }
                }
            }
        }

        state.ticks
    }

    /// Evaluate a query, optionally restricted to changes since a
    /// resolved clock spec, under the root lock.
    pub fn matching_files(&self, query: &Query, since: Option<&ResolvedSince>) -> Vec<FileResult> {
        let state = self.state.lock();
        collect_matches(&state, query, since)
    }

    /// Like [`Root::matching_files`], but also snapshots the clock in
    /// the same lock acquisition, so the reported clock is coherent with
    /// the reported files.
    pub fn query_results(&self, query: &Query, since: Option<&ResolvedSince>) -> QueryResults {
        let state = self.state.lock();
        QueryResults {
            files: collect_matches(&state, query, since),
            clock: clock_id_string(state.ticks),
            ticks: state.ticks,
        }
    }

    /// Register (or replace) a trigger. Fires only for changes after the
    /// current tick.
    pub fn add_trigger(&self, def: TriggerDef) {
        let mut state = self.state.lock();
        let last_ticks = state.ticks;
        state
            .triggers
            .insert(def.name.clone(), TriggerState { def, last_ticks });
    }

    pub fn remove_trigger(&self, name: &str) -> bool {
        self.state.lock().triggers.remove(name).is_some()
    }

    pub fn triggers(&self) -> Vec<TriggerDef> {
        self.state
            .lock()
            .triggers
            .values()
            .map(|t| t.def.clone())
            .collect()
    }

    /// Collect triggers with matches newer than their last firing, and
    /// advance each one's firing point to the current tick.
    pub fn due_triggers(&self) -> Vec<(TriggerDef, Vec<String>)> {
        let mut state = self.state.lock();
        let RootState {
            ticks,
            ref files,
            ref mut triggers,
            ..
        } = *state;

        let mut due = Vec::new();
        for trigger in triggers.values_mut() {
            let since = trigger.last_ticks;
            trigger.last_ticks = ticks;

            let Ok(query) = Query::from_patterns(&trigger.def.patterns) else {
                // Patterns were validated at registration time.
                continue;
            };
            let matched: Vec<String> = files
                .iter()
                .filter(|(name, entry)| entry.otime.ticks > since && query.matches(name.as_str()))
                .map(|(name, _)| name.clone())
                .collect();
            if !matched.is_empty() {
                due.push((trigger.def.clone(), matched));
            }
        }

        due
    }
}

/// Matches plus the clock they were snapshotted at.
#[derive(Debug, Clone)]
pub struct QueryResults {
    pub files: Vec<FileResult>,
    pub clock: String,
    pub ticks: u32,
}

fn collect_matches(
    state: &RootState,
    query: &Query,
    since: Option<&ResolvedSince>,
) -> Vec<FileResult> {
    let mut results = Vec::new();

    for (name, entry) in &state.files {
        if !query.matches(name) {
            continue;
        }
        let (included, is_new) = match since {
            None => (entry.exists, false),
            Some(ResolvedSince::Timestamp { seconds }) => (
                entry.otime.seconds >= *seconds,
                entry.created.seconds >= *seconds,
            ),
            Some(ResolvedSince::Ticks {
                fresh_instance: true,
                ..
            }) => (entry.exists, true),
            Some(ResolvedSince::Ticks {
                ticks,
                fresh_instance: false,
            }) => (entry.otime.ticks > *ticks, entry.created.ticks > *ticks),
        };
        if included {
            results.push(FileResult {
                name: name.clone(),
                entry: entry.clone(),
                is_new,
            });
        }
    }

    results
}

#[cfg(test)]
#[path = "root_tests.rs"]
mod tests;
