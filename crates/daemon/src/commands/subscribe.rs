// SPDX-License-Identifier: MIT

//! Subscriptions: subscribe, unsubscribe.

use std::sync::Arc;

use serde_json::Value;

use vigil_core::{render_file_results, ResolvedSince};
use vigil_engine::{parse_query_spec, QuerySpec};

use super::{resolve_root_or_err, string_arg};
use crate::server::Daemon;
use crate::session::{make_response, Session, Subscription};

/// Register a subscription and immediately push its initial result set,
/// so the client starts from a known state. The push is enqueued before
/// the confirmation response.
pub(crate) fn cmd_subscribe(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };
    let Some(name) = string_arg(session, args, 2, "subscription name") else {
        return;
    };

    let spec = match args.get(3) {
        None => QuerySpec::match_all(),
        Some(value) => match parse_query_spec(value) {
            Ok(spec) => spec,
            Err(e) => {
                session.send_error(e);
                return;
            }
        },
    };

    let since = match &spec.since {
        None => ResolvedSince::Ticks {
            ticks: 0,
            fresh_instance: true,
        },
        Some(clockspec) => match root.resolve_since(clockspec, true) {
            Ok(since) => since,
            Err(e) => {
                session.send_error(e);
                return;
            }
        },
    };

    let results = root.query_results(&spec.query, Some(&since));

    let mut push = make_response();
    push["clock"] = Value::from(results.clock.clone());
    push["subscription"] = Value::from(name);
    push["root"] = Value::from(root.path().to_string_lossy().into_owned());
    push["files"] = render_file_results(&results.files);
    push["is_fresh_instance"] = Value::from(since.is_fresh_instance());
    session.enqueue(push, true);

    session.add_subscription(Subscription {
        name: name.to_string(),
        root: root.path().to_path_buf(),
        query: spec.query,
        last_ticks: results.ticks,
    });

    let mut response = make_response();
    response["subscribe"] = Value::from(name);
    response["clock"] = Value::from(results.clock);
    session.send_and_dispose(response);
}

pub(crate) fn cmd_unsubscribe(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(_root) = resolve_root_or_err(daemon, session, args, 1, false) else {
        return;
    };
    let Some(name) = string_arg(session, args, 2, "subscription name") else {
        return;
    };

    let deleted = session.remove_subscription(name);

    let mut response = make_response();
    response["unsubscribe"] = Value::from(name);
    response["deleted"] = Value::from(deleted);
    session.send_and_dispose(response);
}

#[cfg(test)]
#[path = "subscribe_tests.rs"]
mod tests;
