// SPDX-License-Identifier: MIT

//! Vigil Daemon (vigild)
//!
//! Background process that owns the watched roots and serves the client
//! protocol on a unix socket. Typically started by a client wrapper; it
//! takes no flags beyond `--help`/`--version`, and commands are
//! delivered on the socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use tracing::{error, info};

use vigil_daemon::{Config, Server, ServerError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before touching the state directory
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                println!("Vigil Daemon - watches directory trees and serves queries about them");
                println!();
                println!("USAGE:");
                println!("    vigild");
                println!();
                println!("The daemon listens on a unix socket in its state directory");
                println!("(VIGIL_STATE_DIR, default ~/.local/state/vigil) and is driven");
                println!("entirely by commands delivered on that socket.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: vigild [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Rotate the log if it has grown too large, then mark this startup
    // attempt (before tracing setup, so wrappers can find it).
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("starting vigild");

    let server = match Server::start(config.clone()).await {
        Ok(server) => server,
        Err(ServerError::AlreadyRunning(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("vigild is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write the error synchronously; tracing is non-blocking and
            // may not flush before the process exits.
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!("daemon ready, listening on {}", config.socket_path.display());

    // Signal ready for a parent process waiting on startup
    println!("READY");

    server.run().await?;
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (vigild.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `vigild.log` -> `vigild.log.1` -> `.2` -> `.3`, deleting the
/// oldest. Best-effort: rotation failures never block startup.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else, so a
/// wrapper can find where the current attempt begins.
/// Full format: "--- vigild: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- vigild: starting (pid: ";

fn write_startup_marker(config: &Config) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(
        file,
        "{}{}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id()
    )?;

    Ok(())
}

/// Write a startup error synchronously so it is visible even if the
/// process exits before the non-blocking appender flushes.
fn write_startup_error(config: &Config, error: &ServerError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = config
        .log_path
        .parent()
        .ok_or("log path has no parent directory")?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or("log path has no file name")?;

    std::fs::create_dir_all(dir)?;

    // Rotation happens at startup via rotate_log_if_needed
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
