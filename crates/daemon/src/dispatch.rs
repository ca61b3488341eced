// SPDX-License-Identifier: MIT

//! The command registry and request dispatcher.
//!
//! The registry is populated once before the accept loop starts and is
//! immutable afterwards, so workers read it without synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::commands;
use crate::server::Daemon;
use crate::session::Session;

/// A command handler. Handlers run synchronously on the session's
/// worker, produce zero or more responses via the session's queue, and
/// must not retain the request after returning.
pub type CommandFn = fn(&Arc<Daemon>, &Arc<Session>, &[Value]);

pub struct CommandRegistry {
    handlers: HashMap<&'static str, CommandFn>,
}

impl CommandRegistry {
    fn get(&self, name: &str) -> Option<CommandFn> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Wire up the command handlers.
pub(crate) fn register_commands() -> CommandRegistry {
    let defs: &[(&'static str, CommandFn)] = &[
        ("find", commands::query::cmd_find),
        ("since", commands::query::cmd_since),
        ("query", commands::query::cmd_query),
        ("watch", commands::watch::cmd_watch),
        ("watch-list", commands::watch::cmd_watch_list),
        ("watch-del", commands::watch::cmd_watch_del),
        ("trigger", commands::trigger::cmd_trigger),
        ("trigger-list", commands::trigger::cmd_trigger_list),
        ("trigger-del", commands::trigger::cmd_trigger_del),
        ("subscribe", commands::subscribe::cmd_subscribe),
        ("unsubscribe", commands::subscribe::cmd_unsubscribe),
        ("shutdown-server", commands::server::cmd_shutdown),
        ("log-level", commands::server::cmd_log_level),
        ("log", commands::server::cmd_log),
        ("version", commands::server::cmd_version),
        ("clock", commands::server::cmd_clock),
        ("get-sockname", commands::server::cmd_get_sockname),
        ("get-pid", commands::server::cmd_get_pid),
    ];

    CommandRegistry {
        handlers: defs.iter().copied().collect(),
    }
}

/// Validate the request envelope and invoke the named handler.
pub fn dispatch(daemon: &Arc<Daemon>, session: &Arc<Session>, request: &Value) {
    let Some(args) = request.as_array().filter(|args| !args.is_empty()) else {
        session.send_error("invalid command (expected an array with some elements!)");
        return;
    };

    let Some(name) = args[0].as_str() else {
        session.send_error("invalid command: expected element 0 to be the command name");
        return;
    };

    match daemon.commands.get(name) {
        Some(handler) => handler(daemon, session, args),
        None => session.send_error(format!("unknown command {name}")),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
