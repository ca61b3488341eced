// SPDX-License-Identifier: MIT

//! A connected-client session: outbound FIFO, wakeup, subscriptions,
//! log level, and the mirrored wire encoding.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use vigil_core::LogLevel;
use vigil_engine::Query;

use crate::wire::WireFormat;

/// Build a response document. Every response the server produces starts
/// here, so the `version` envelope field is always present.
pub fn make_response() -> Value {
    serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })
}

/// A long-lived association between a session and a query whose matches
/// produce asynchronous pushes. Owned by the session; destroyed with it.
pub struct Subscription {
    pub name: String,
    pub root: PathBuf,
    pub query: Query,
    /// Root tick up to which matches have already been pushed.
    pub last_ticks: u32,
}

/// One per accepted connection.
pub struct Session {
    id: u64,
    client_mode: bool,
    /// Poked by any thread that enqueues toward this session; the worker
    /// multiplexes it with the connection.
    wakeup: Notify,
    queue: Mutex<VecDeque<Value>>,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    log_level: Mutex<LogLevel>,
    format: Mutex<WireFormat>,
}

impl Session {
    pub(crate) fn new(id: u64, client_mode: bool) -> Arc<Session> {
        Arc::new(Session {
            id,
            client_mode,
            wakeup: Notify::new(),
            queue: Mutex::new(VecDeque::new()),
            subscriptions: Mutex::new(HashMap::new()),
            log_level: Mutex::new(LogLevel::Off),
            format: Mutex::new(WireFormat::default()),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn client_mode(&self) -> bool {
        self.client_mode
    }

    /// Append a response to the outbound FIFO. With `wake`, also poke
    /// the worker so it drains the queue promptly; without, the worker's
    /// post-dispatch drain picks it up.
    pub fn enqueue(&self, response: Value, wake: bool) {
        self.queue.lock().push_back(response);
        if wake {
            self.wakeup.notify_one();
        }
    }

    pub fn send_and_dispose(&self, response: Value) {
        self.enqueue(response, false);
    }

    /// Build and enqueue an error response.
    pub fn send_error(&self, message: impl std::fmt::Display) {
        let mut response = make_response();
        response["error"] = Value::from(message.to_string());
        self.send_and_dispose(response);
    }

    pub(crate) fn pop_response(&self) -> Option<Value> {
        self.queue.lock().pop_front()
    }

    pub(crate) async fn notified(&self) {
        self.wakeup.notified().await;
    }

    /// The wire format of the most recent request; responses mirror it.
    pub fn format(&self) -> WireFormat {
        *self.format.lock()
    }

    pub(crate) fn set_format(&self, format: WireFormat) {
        *self.format.lock() = format;
    }

    pub fn log_level(&self) -> LogLevel {
        *self.log_level.lock()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        *self.log_level.lock() = level;
    }

    /// Register a subscription, replacing any previous one of the same
    /// name.
    pub fn add_subscription(&self, sub: Subscription) {
        self.subscriptions.lock().insert(sub.name.clone(), sub);
    }

    pub fn remove_subscription(&self, name: &str) -> bool {
        self.subscriptions.lock().remove(name).is_some()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub(crate) fn with_subscriptions<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Subscription>) -> R,
    ) -> R {
        f(&mut self.subscriptions.lock())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
