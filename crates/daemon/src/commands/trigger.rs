// SPDX-License-Identifier: MIT

//! Trigger management: trigger, trigger-list, trigger-del.
//!
//! Request shape: `["trigger", <root>, <name>, <pattern>..., "--", <argv>...]`.

use std::sync::Arc;

use serde_json::Value;

use vigil_engine::{Query, TriggerDef};

use super::{resolve_root_or_err, string_arg};
use crate::server::Daemon;
use crate::session::{make_response, Session};
use crate::state;

pub(crate) fn cmd_trigger(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };
    let Some(name) = string_arg(session, args, 2, "trigger name") else {
        return;
    };

    let rest = &args[3..];
    let separator = rest.iter().position(|v| v.as_str() == Some("--"));

    let (pattern_values, command_values) = match separator {
        Some(at) => (&rest[..at], &rest[at + 1..]),
        None => (rest, &rest[rest.len()..]),
    };

    let Some(patterns) = all_strings(session, pattern_values, "pattern") else {
        return;
    };
    let Some(command) = all_strings(session, command_values, "command") else {
        return;
    };

    if patterns.is_empty() {
        session.send_error("no patterns were specified");
        return;
    }
    if command.is_empty() {
        session.send_error("no command was specified");
        return;
    }
    if let Err(e) = Query::from_patterns(&patterns) {
        session.send_error(e);
        return;
    }

    root.add_trigger(TriggerDef {
        name: name.to_string(),
        patterns,
        command,
    });
    state::save(daemon);

    let mut response = make_response();
    response["triggered"] = Value::from(name);
    session.send_and_dispose(response);
}

pub(crate) fn cmd_trigger_list(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, false) else {
        return;
    };

    let triggers =
        serde_json::to_value(root.triggers()).unwrap_or_else(|_| Value::Array(Vec::new()));

    let mut response = make_response();
    response["triggers"] = triggers;
    session.send_and_dispose(response);
}

pub(crate) fn cmd_trigger_del(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, false) else {
        return;
    };
    let Some(name) = string_arg(session, args, 2, "trigger name") else {
        return;
    };

    let removed = root.remove_trigger(name);
    state::save(daemon);

    let mut response = make_response();
    response["trigger-del"] = Value::from(removed);
    response["trigger"] = Value::from(name);
    session.send_and_dispose(response);
}

/// Require every element to be a string.
fn all_strings(session: &Session, values: &[Value], what: &str) -> Option<Vec<String>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let Some(s) = value.as_str() else {
            session.send_error(format!("trigger {what} arguments must be strings"));
            return None;
        };
        out.push(s.to_string());
    }
    Some(out)
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
