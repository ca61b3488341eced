// SPDX-License-Identifier: MIT

//! Watch management: watch, watch-list, watch-del.

use std::sync::Arc;

use serde_json::Value;

use super::resolve_root_or_err;
use crate::server::Daemon;
use crate::session::{make_response, Session};
use crate::state;

pub(crate) fn cmd_watch(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };
    state::save(daemon);

    let mut response = make_response();
    response["watch"] = Value::from(root.path().to_string_lossy().into_owned());
    session.send_and_dispose(response);
}

pub(crate) fn cmd_watch_list(daemon: &Arc<Daemon>, session: &Arc<Session>, _args: &[Value]) {
    let roots: Vec<Value> = daemon
        .engine
        .watch_list()
        .into_iter()
        .map(|p| Value::from(p.to_string_lossy().into_owned()))
        .collect();

    let mut response = make_response();
    response["roots"] = Value::Array(roots);
    session.send_and_dispose(response);
}

pub(crate) fn cmd_watch_del(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, false) else {
        return;
    };
    let removed = daemon.engine.remove(&root);
    state::save(daemon);

    let mut response = make_response();
    response["watch-del"] = Value::from(removed);
    response["root"] = Value::from(root.path().to_string_lossy().into_owned());
    session.send_and_dispose(response);
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
