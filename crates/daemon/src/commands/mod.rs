// SPDX-License-Identifier: MIT

//! Command handlers, one module per family.

pub(crate) mod query;
pub(crate) mod server;
pub(crate) mod subscribe;
pub(crate) mod trigger;
pub(crate) mod watch;

use std::sync::Arc;

use serde_json::Value;

use vigil_engine::Root;

use crate::server::Daemon;
use crate::session::Session;

/// Read the path argument at `index` and resolve it to a root handle.
/// On any failure an error response is sent and `None` returned; callers
/// bail out without replying further.
pub(crate) fn resolve_root_or_err(
    daemon: &Daemon,
    session: &Session,
    args: &[Value],
    index: usize,
    create: bool,
) -> Option<Arc<Root>> {
    let Some(element) = args.get(index) else {
        session.send_error("wrong number of arguments");
        return None;
    };

    let Some(root_name) = element.as_str() else {
        session.send_error(format!(
            "invalid value for argument {index}, expected a string naming the root dir"
        ));
        return None;
    };

    let resolved = if session.client_mode() {
        daemon.engine.resolve_client_mode(root_name)
    } else {
        daemon.engine.resolve(root_name, create)
    };

    match resolved {
        Ok(root) => Some(root),
        Err(e) => {
            session.send_error(format!("unable to resolve root {root_name}: {e}"));
            None
        }
    }
}

/// Read a required string argument at `index`, describing it on failure.
pub(crate) fn string_arg<'a>(
    session: &Session,
    args: &'a [Value],
    index: usize,
    what: &str,
) -> Option<&'a str> {
    match args.get(index).map(|v| v.as_str()) {
        Some(Some(s)) => Some(s),
        Some(None) => {
            session.send_error(format!("argument {index} must be a {what} string"));
            None
        }
        None => {
            session.send_error("wrong number of arguments");
            None
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
