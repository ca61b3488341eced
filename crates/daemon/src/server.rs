// SPDX-License-Identifier: MIT

//! Server lifecycle: startup, the run loop, and coordinated shutdown.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use vigil_engine::Engine;

use crate::broadcast;
use crate::config::{Config, ConfigError};
use crate::dispatch::{register_commands, CommandRegistry};
use crate::listener::Listener;
use crate::reaper::Reaper;
use crate::sessions::SessionRegistry;
use crate::state;

/// Fatal startup failures. Everything else is session-scoped or local.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("socket path {} is too long", .0.display())]
    SocketPathTooLong(PathBuf),

    #[error("vigild is already running (lock held on {})", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },
}

impl ServerError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> ServerError {
        ServerError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Shared daemon context for handlers, the broadcaster, and workers.
pub struct Daemon {
    pub config: Config,
    pub engine: Arc<Engine>,
    pub sessions: SessionRegistry,
    pub commands: CommandRegistry,
    pub reaper: Reaper,
    /// Notified by `shutdown-server`; awaited by [`Server::run`].
    pub shutdown: Notify,
}

/// A started server: the daemon context plus its background tasks.
pub struct Server {
    daemon: Arc<Daemon>,
    accept: JoinHandle<()>,
    pump: JoinHandle<()>,
    /// Held for the server's lifetime; releasing it lets the next
    /// instance start.
    _lock_file: std::fs::File,
}

impl Server {
    /// Bind the socket and start the background tasks. Failures here are
    /// fatal and turn into a non-zero exit in `main`.
    pub async fn start(config: Config) -> Result<Server, ServerError> {
        std::fs::create_dir_all(&config.state_dir)
            .map_err(|e| ServerError::io(format!("mkdir({})", config.state_dir.display()), e))?;
        let lock_file = acquire_instance_lock(&config)?;
        raise_fd_limit();

        let socket = Listener::bind(&config.socket_path)?;
        let (engine, events) = Engine::new();
        let reaper = Reaper::spawn();

        let daemon = Arc::new(Daemon {
            config,
            engine,
            sessions: SessionRegistry::new(),
            commands: register_commands(),
            reaper,
            shutdown: Notify::new(),
        });

        // Re-watch persisted roots before accepting the first client.
        state::load(&daemon);

        let accept = tokio::spawn(Listener::new(socket, Arc::clone(&daemon)).run());
        let pump = tokio::spawn(broadcast::change_pump(Arc::clone(&daemon), events));

        info!(
            "listening on {}",
            daemon.config.socket_path.display()
        );
        Ok(Server {
            daemon,
            accept,
            pump,
            _lock_file: lock_file,
        })
    }

    pub fn daemon(&self) -> Arc<Daemon> {
        Arc::clone(&self.daemon)
    }

    /// Run until `shutdown-server` or a termination signal, then tear
    /// down: stop accepting, free roots, join the reaper.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut sigterm =
            signal(SignalKind::terminate()).map_err(|e| ServerError::io("signal(SIGTERM)", e))?;
        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| ServerError::io("signal(SIGINT)", e))?;

        tokio::select! {
            _ = self.daemon.shutdown.notified() => {
                info!("shutdown requested via command");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                self.daemon.engine.free_all();
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                self.daemon.engine.free_all();
            }
        }

        // Aborting the accept task drops the listening socket: no
        // further connections are accepted.
        self.accept.abort();
        self.pump.abort();
        self.daemon.reaper.join().await;
        let _ = std::fs::remove_file(&self.daemon.config.socket_path);
        info!("daemon stopped");
        close_standard_streams();
        Ok(())
    }
}

/// Flush and release the standard streams as the last teardown step
/// before the process reports its exit. The underlying descriptors stay
/// open: closing fds 0-2 outright needs raw-fd surgery the workspace's
/// `unsafe` ban rules out, and the process exits immediately after.
fn close_standard_streams() {
    use std::io::Write;

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    drop(io::stdin());
    drop(io::stdout());
    drop(io::stderr());
}

/// Below this many open files the descriptor budget is too small for a
/// watching daemon; complain loudly.
const FD_LIMIT_FLOOR: u64 = 10240;

fn raise_fd_limit() {
    match rlimit::Resource::NOFILE.get() {
        Ok((soft, hard)) => {
            if soft < hard {
                if let Err(e) = rlimit::Resource::NOFILE.set(hard, hard) {
                    warn!(error = %e, "failed to raise file descriptor limit");
                }
            }
            let effective = rlimit::Resource::NOFILE
                .get()
                .map(|(soft, _)| soft)
                .unwrap_or(soft);
            if effective < FD_LIMIT_FLOOR {
                warn!(
                    limit = effective,
                    "file descriptor limit is very low, raise it for serious use"
                );
            }
        }
        Err(e) => warn!(error = %e, "failed to read file descriptor limit"),
    }
}

fn acquire_instance_lock(config: &Config) -> Result<std::fs::File, ServerError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&config.lock_path)
        .map_err(|e| ServerError::io(format!("open({})", config.lock_path.display()), e))?;

    file.try_lock_exclusive()
        .map_err(|_| ServerError::AlreadyRunning(config.lock_path.clone()))?;

    // Record our pid for humans poking at the state directory.
    let _ = file.set_len(0);
    let _ = io::Write::write_all(&mut (&file), format!("{}\n", std::process::id()).as_bytes());

    Ok(file)
}

#[cfg(test)]
pub(crate) fn test_daemon(dir: &std::path::Path) -> Arc<Daemon> {
    let (engine, _events) = Engine::new();
    Arc::new(Daemon {
        config: Config::for_state_dir(dir.to_path_buf()),
        engine,
        sessions: SessionRegistry::new(),
        commands: register_commands(),
        reaper: Reaper::spawn(),
        shutdown: Notify::new(),
    })
}

#[cfg(test)]
pub(crate) fn test_daemon_with_events(
    dir: &std::path::Path,
) -> (
    Arc<Daemon>,
    tokio::sync::mpsc::UnboundedReceiver<vigil_engine::RootEvent>,
) {
    let (engine, events) = Engine::new();
    (
        Arc::new(Daemon {
            config: Config::for_state_dir(dir.to_path_buf()),
            engine,
            sessions: SessionRegistry::new(),
            commands: register_commands(),
            reaper: Reaper::spawn(),
            shutdown: Notify::new(),
        }),
        events,
    )
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
