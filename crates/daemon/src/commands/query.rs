// SPDX-License-Identifier: MIT

//! File queries: find, since, query.
//!
//! `find` and `since` take legacy trailing pattern arguments; `query`
//! takes a query-spec object. All three imply a watch on the root.

use std::sync::Arc;

use serde_json::Value;

use vigil_core::{render_file_results, ClockSpec, ResolvedSince};
use vigil_engine::{parse_query_spec, Query, QuerySpec, Root};

use super::resolve_root_or_err;
use crate::server::Daemon;
use crate::session::{make_response, Session};

pub(crate) fn cmd_find(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };
    let Some(query) = patterns_from_args(session, args, 2) else {
        return;
    };

    let results = root.query_results(&query, None);

    let mut response = make_response();
    response["clock"] = Value::from(results.clock);
    response["files"] = render_file_results(&results.files);
    session.send_and_dispose(response);
}

pub(crate) fn cmd_since(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };

    let Some(spec_value) = args.get(2) else {
        session.send_error("wrong number of arguments");
        return;
    };
    let spec = match ClockSpec::parse(spec_value) {
        Ok(spec) => spec,
        Err(e) => {
            session.send_error(format!("argument 2 is not a valid clockspec: {e}"));
            return;
        }
    };
    let since = match root.resolve_since(&spec, true) {
        Ok(since) => since,
        Err(e) => {
            session.send_error(e);
            return;
        }
    };

    let Some(query) = patterns_from_args(session, args, 3) else {
        return;
    };

    respond_with_matches(session, &root, &query, &since);
}

pub(crate) fn cmd_query(daemon: &Arc<Daemon>, session: &Arc<Session>, args: &[Value]) {
    let Some(root) = resolve_root_or_err(daemon, session, args, 1, true) else {
        return;
    };

    let spec = match args.get(2) {
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
        None => None,
        Some(clockspec) => match root.resolve_since(clockspec, true) {
            Ok(since) => Some(since),
            Err(e) => {
                session.send_error(e);
                return;
            }
        },
    };

    match since {
        Some(since) => respond_with_matches(session, &root, &spec.query, &since),
        None => {
            let results = root.query_results(&spec.query, None);
            let mut response = make_response();
            response["clock"] = Value::from(results.clock);
            response["files"] = render_file_results(&results.files);
            response["is_fresh_instance"] = Value::from(false);
            session.send_and_dispose(response);
        }
    }
}

fn respond_with_matches(
    session: &Session,
    root: &Root,
    query: &Query,
    since: &ResolvedSince,
) {
    let results = root.query_results(query, Some(since));

    let mut response = make_response();
    response["clock"] = Value::from(results.clock);
    response["files"] = render_file_results(&results.files);
    response["is_fresh_instance"] = Value::from(since.is_fresh_instance());
    session.send_and_dispose(response);
}

/// Collect the trailing legacy pattern arguments starting at `first`.
fn patterns_from_args(session: &Session, args: &[Value], first: usize) -> Option<Query> {
    let mut patterns = Vec::new();
    for (offset, value) in args.iter().skip(first).enumerate() {
        let Some(pattern) = value.as_str() else {
            session.send_error(format!(
                "argument {} must be a pattern string",
                first + offset
            ));
            return None;
        };
        patterns.push(pattern.to_string());
    }

    match Query::from_patterns(&patterns) {
        Ok(query) => Some(query),
        Err(e) => {
            session.send_error(e);
            None
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
