// SPDX-License-Identifier: MIT

//! Fan-out toward sessions: log broadcasts, subscription pushes, and
//! trigger spawning.
//!
//! Everything here works from a registry snapshot and enqueues with
//! wake; enqueue is O(1) and performs no I/O.

use std::process::Stdio;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use vigil_core::{render_file_results, LogLevel, ResolvedSince};
use vigil_engine::{Root, RootEvent, TriggerDef};

use crate::server::Daemon;
use crate::session::make_response;
use crate::sessions::SessionRegistry;

/// Push a log line to every session whose threshold admits it.
pub fn log_to_clients(sessions: &SessionRegistry, level: LogLevel, text: &str) {
    for session in sessions.snapshot() {
        if session.log_level().receives(level) {
            let mut push = make_response();
            push["log"] = Value::from(text);
            session.enqueue(push, true);
        }
    }
}

/// Consume root-changed events from the engine and fan them out:
/// subscription pushes first, then trigger spawning.
pub async fn change_pump(daemon: Arc<Daemon>, mut events: mpsc::UnboundedReceiver<RootEvent>) {
    while let Some(event) = events.recv().await {
        let Some(root) = daemon.engine.get(&event.root) else {
            // Root was removed between the event and now.
            continue;
        };
        notify_subscribers(&daemon, &root);
        run_triggers(&daemon, &root);
    }
}

/// Evaluate each session's subscriptions on this root and push deltas.
pub(crate) fn notify_subscribers(daemon: &Daemon, root: &Arc<Root>) {
    for session in daemon.sessions.snapshot() {
        let pushes = session.with_subscriptions(|subs| {
            let mut pushes = Vec::new();
            for sub in subs.values_mut().filter(|s| s.root == root.path()) {
                let since = ResolvedSince::Ticks {
                    ticks: sub.last_ticks,
                    fresh_instance: false,
                };
                let results = root.query_results(&sub.query, Some(&since));
                sub.last_ticks = results.ticks;
                if results.files.is_empty() {
                    continue;
                }

                let mut push = make_response();
                push["clock"] = Value::from(results.clock);
                push["subscription"] = Value::from(sub.name.clone());
                push["root"] = Value::from(root.path().to_string_lossy().into_owned());
                push["files"] = render_file_results(&results.files);
                push["is_fresh_instance"] = Value::from(false);
                pushes.push(push);
            }
            pushes
        });

        for push in pushes {
            session.enqueue(push, true);
        }
    }
}

/// Spawn the command of every trigger with fresh matches, appending the
/// matched names to the argv and handing the child to the reaper.
pub(crate) fn run_triggers(daemon: &Daemon, root: &Arc<Root>) {
    for (def, files) in root.due_triggers() {
        spawn_trigger(daemon, root, &def, &files);
    }
}

fn spawn_trigger(daemon: &Daemon, root: &Arc<Root>, def: &TriggerDef, files: &[String]) {
    let Some((program, base_args)) = def.command.split_first() else {
        return;
    };

    let spawned = tokio::process::Command::new(program)
        .args(base_args)
        .args(files)
        .current_dir(root.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(child) => {
            debug!(trigger = %def.name, files = files.len(), "spawned trigger command");
            daemon.reaper.register(child);
        }
        Err(e) => {
            warn!(trigger = %def.name, error = %e, "failed to spawn trigger command");
        }
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
