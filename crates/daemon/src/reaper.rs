// SPDX-License-Identifier: MIT

//! Reaping of trigger-spawned child processes.
//!
//! Only the reaper observes child termination: every spawned child is
//! registered here and polled with `try_wait` every 200 ms until the
//! daemon shuts down and joins the task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Child;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const REAP_INTERVAL: Duration = Duration::from_millis(200);

pub struct Reaper {
    children: Arc<Mutex<Vec<Child>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<Notify>,
}

impl Reaper {
    /// Start the reaper task.
    pub fn spawn() -> Reaper {
        let children = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(Notify::new());
        let handle = tokio::spawn(reap_loop(Arc::clone(&children), Arc::clone(&stop)));

        Reaper {
            children,
            handle: Mutex::new(Some(handle)),
            stop,
        }
    }

    /// Hand a spawned child over to the reaper.
    pub fn register(&self, child: Child) {
        self.children.lock().push(child);
    }

    /// Children spawned and not yet observed to exit.
    pub fn live_children(&self) -> usize {
        self.children.lock().len()
    }

    /// Stop the reap loop and wait for it to finish. Idempotent.
    pub async fn join(&self) {
        self.stop.notify_one();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn reap_loop(children: Arc<Mutex<Vec<Child>>>, stop: Arc<Notify>) {
    let mut interval = tokio::time::interval(REAP_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => reap_children(&children),
            _ = stop.notified() => {
                // One final sweep so short-lived children do not linger
                // as zombies across shutdown.
                reap_children(&children);
                break;
            }
        }
    }
}

fn reap_children(children: &Mutex<Vec<Child>>) {
    children.lock().retain_mut(|child| match child.try_wait() {
        Ok(Some(status)) => {
            debug!(%status, "reaped child");
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!(error = %e, "failed to poll child");
            false
        }
    });
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
