// SPDX-License-Identifier: MIT

//! Vigil Daemon (vigild)
//!
//! Client-facing front end of the filesystem-watching daemon: a unix
//! stream socket accepting framed structured requests, a per-session
//! worker draining an outbound FIFO, a name-keyed command registry, and
//! server-initiated pushes for log broadcasts and subscriptions.
//!
//! Architecture:
//! - Listener task: accepts connections, registers sessions, spawns one
//!   worker task per session
//! - Change pump: consumes engine root events, fans out subscription
//!   pushes and spawns trigger commands
//! - Reaper task: polls spawned trigger children every 200 ms

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broadcast;
mod commands;
pub mod config;
pub mod dispatch;
mod env;
pub mod listener;
pub mod reaper;
pub mod server;
pub mod session;
pub mod sessions;
pub mod state;
pub mod wire;

pub use config::{Config, ConfigError};
pub use server::{Daemon, Server, ServerError};
pub use session::{make_response, Session, Subscription};
pub use wire::{WireFormat, MAX_MESSAGE_SIZE};
