// SPDX-License-Identifier: MIT

//! The process-wide registry of watched roots.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::root::{Change, Root};
use crate::scan::scan_root;
use crate::unix_now;

/// Emitted whenever a root's file table changes; consumed by the
/// daemon's change pump for subscription and trigger fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEvent {
    pub root: PathBuf,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("directory {} is not watched", .0.display())]
    NotWatched(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
}

/// Registry of watched roots plus the change-event channel.
pub struct Engine {
    roots: Mutex<HashMap<PathBuf, Arc<Root>>>,
    events: mpsc::UnboundedSender<RootEvent>,
}

impl Engine {
    /// Create the engine and the receiving end of its event channel.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RootEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Engine {
                roots: Mutex::new(HashMap::new()),
                events,
            }),
            rx,
        )
    }

    /// Resolve a path argument to a root handle, optionally creating a
    /// new watch (with its initial scan).
    pub fn resolve(&self, name: &str, create: bool) -> Result<Arc<Root>, EngineError> {
        let canonical = std::fs::canonicalize(name).map_err(|source| EngineError::Io {
            path: name.to_string(),
            source,
        })?;

        if let Some(root) = self.roots.lock().get(&canonical) {
            return Ok(Arc::clone(root));
        }
        if !create {
            return Err(EngineError::NotWatched(canonical));
        }

        let md = std::fs::metadata(&canonical).map_err(|source| EngineError::Io {
            path: name.to_string(),
            source,
        })?;
        if !md.is_dir() {
            return Err(EngineError::NotADirectory(canonical));
        }

        // Scan outside the registry lock; a concurrent watch of the same
        // path wins the insert race and we use its root instead.
        let scanned = scan_root(&canonical).map_err(|source| EngineError::Io {
            path: name.to_string(),
            source,
        })?;
        let file_count = scanned.len();
        let root = Arc::new(Root::from_scan(canonical.clone(), scanned, unix_now()));

        let root = {
            let mut roots = self.roots.lock();
            Arc::clone(
                roots
                    .entry(canonical)
                    .or_insert_with(|| Arc::clone(&root)),
            )
        };
        info!(root = %root.path().display(), files = file_count, "watching new root");
        Ok(root)
    }

    /// The resolver used by single-shot client-mode sessions: never
    /// creates new watches.
    pub fn resolve_client_mode(&self, name: &str) -> Result<Arc<Root>, EngineError> {
        self.resolve(name, false)
    }

    /// Look up an already-watched root by its canonical path.
    pub fn get(&self, path: &std::path::Path) -> Option<Arc<Root>> {
        self.roots.lock().get(path).cloned()
    }

    /// Stop watching a root. Returns whether it was watched.
    pub fn remove(&self, root: &Root) -> bool {
        let removed = self.roots.lock().remove(root.path()).is_some();
        if removed {
            info!(root = %root.path().display(), "watch removed");
        }
        removed
    }

    /// Paths of all watched roots, sorted.
    pub fn watch_list(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.roots.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Drop every watched root. Part of server shutdown.
    pub fn free_all(&self) {
        self.roots.lock().clear();
    }

    /// Apply observed filesystem facts to a root and wake the change
    /// pump. This is the integration seam for the external watcher.
    pub fn record_changes(&self, root: &Arc<Root>, changes: &[Change]) {
        root.apply_changes(changes, unix_now());
        // The pump is gone only during shutdown; dropping the event then
        // is fine.
        let _ = self.events.send(RootEvent {
            root: root.path().to_path_buf(),
        });
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
