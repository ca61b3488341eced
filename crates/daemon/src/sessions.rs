// SPDX-License-Identifier: MIT

//! The process-wide registry of live sessions.
//!
//! Broadcast fan-out takes a snapshot under the registry lock and then
//! enqueues per session; enqueue touches only the session's own queue
//! lock, so log emission from code that already holds the registry lock
//! cannot deadlock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::Session;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, Arc<Session>>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Create and register a new session.
    pub fn register(&self, client_mode: bool) -> Arc<Session> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Session::new(id, client_mode);
        self.sessions.lock().insert(id, Arc::clone(&session));
        session
    }

    /// Remove a session. Exactly one caller wins; the loser sees `None`.
    pub fn remove(&self, id: u64) -> Option<Arc<Session>> {
        self.sessions.lock().remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Snapshot of every live session, for broadcast iteration outside
    /// the registry lock.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
