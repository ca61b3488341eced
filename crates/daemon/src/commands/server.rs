// SPDX-License-Identifier: MIT

//! Server-level commands: version, pids, clocks, logging, shutdown.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use vigil_core::{this_pid, LogLevel};

use super::{resolve_root_or_err, string_arg};
use crate::broadcast;
use crate::server::Daemon;
use crate::session::{make_response, Session};

pub(crate) fn cmd_version(_daemon: &Arc<Daemon>, session: &Arc<Session>, _args: &[Value]) {
    session.send_and_dispose(make_response());
}

pub(crate) fn cmd_get_pid(_daemon: &Arc<Daemon>, session: &Arc<Session>, _args: &[Value]) {
    let mut response = make_response();
    response["pid"] = Value::from(this_pid());
    session.send_and_dispose(response);
}

pub(crate) fn cmd_get_sockname(daemon: &Arc<Daemon>, session: &Arc<Session>, _args: &[Value]) {
    let mut response = make_response();
    response["sockname"] = Value::from(
        daemon
            .config
            .socket_path
            .to_string_lossy()
            .into_owned(),
    );
    session.send_and_dispose(response);
}

/// Report a root's current clock without bumping it.
pub(crate) fn cmd_clock(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, false) else {
        return;
    };
    let mut response = make_response();
    root.annotate_with_clock(&mut response);
    session.send_and_dispose(response);
}

pub(crate) fn cmd_log_level(_daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(name) = string_arg(session, args, 1, "log level") else {
        return;
    };
    let level: LogLevel = match name.parse() {
        Ok(level) => level,
        Err(e) => {
            session.send_error(e);
            return;
        }
    };

    session.set_log_level(level);
    let mut response = make_response();
    response["log_level"] = Value::from(level.as_str());
    session.send_and_dispose(response);
}

/// Emit a line through the daemon log and the client broadcaster.
pub(crate) fn cmd_log(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(name) = string_arg(session, args, 1, "log level") else {
        return;
    };
    let level: LogLevel = match name.parse() {
        Ok(level) => level,
        Err(e) => {
            session.send_error(e);
            return;
        }
    };
    let Some(text) = string_arg(session, args, 2, "log message") else {
        return;
    };

    match level {
        LogLevel::Error => tracing::error!(client = session.id(), "{}", text),
        _ => tracing::debug!(client = session.id(), "{}", text),
    }
    broadcast::log_to_clients(&daemon.sessions, level, text);

    let mut response = make_response();
    response["logged"] = Value::from(true);
    session.send_and_dispose(response);
}

/// Tear the server down: warn, stop watching, deregister ourselves, and
/// wake the run loop, which closes the listener and joins the reaper.
/// No response is produced; the peer observes EOF.
pub(crate) fn cmd_shutdown(daemon: &Arc<Daemon>, session: &Arc<Session>, _args: &[Value]) {
    warn!("shutdown-server was requested, exiting!");
    broadcast::log_to_clients(
        &daemon.sessions,
        LogLevel::Error,
        "shutdown-server was requested, exiting!",
    );

    // Remove our own session first so the worker's exit path does not
    // race the teardown.
    daemon.sessions.remove(session.id());
    daemon.engine.free_all();
    daemon.shutdown.notify_one();
}

#[cfg(test)]
#[path = "server_cmd_tests.rs"]
mod tests;
