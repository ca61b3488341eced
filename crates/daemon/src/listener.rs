// SPDX-License-Identifier: MIT

//! Socket binding, the accept loop, and the per-session worker.
//!
//! The worker multiplexes a cancel-safe buffered read from the
//! connection with the session's wakeup, and drains the outbound queue
//! after every iteration. When both are ready, the read is serviced
//! first.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::dispatch::dispatch;
use crate::server::{Daemon, ServerError};
use crate::session::Session;
use crate::wire::{self, Decoder};

/// `sun_path` is 108 bytes on Linux including the terminator.
const MAX_SOCKET_PATH: usize = 107;

/// Accept task for the listening socket.
pub struct Listener {
    socket: UnixListener,
    daemon: Arc<Daemon>,
}

impl Listener {
    /// Bind the stream socket, unlinking any stale entry first. The
    /// instance lock guarantees nothing live is bound there.
    pub fn bind(path: &Path) -> Result<UnixListener, ServerError> {
        if path.as_os_str().len() > MAX_SOCKET_PATH {
            return Err(ServerError::SocketPathTooLong(path.to_path_buf()));
        }
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
        UnixListener::bind(path)
            .map_err(|e| ServerError::io(format!("bind({})", path.display()), e))
    }

    pub fn new(socket: UnixListener, daemon: Arc<Daemon>) -> Self {
        Listener { socket, daemon }
    }

    /// Accept connections until the task is torn down at shutdown,
    /// registering a session and spawning a worker for each.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _addr)) => {
                    let session = self.daemon.sessions.register(false);
                    debug!(session = session.id(), "client connected");
                    let daemon = Arc::clone(&self.daemon);
                    tokio::spawn(run_session(daemon, stream, session));
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// One worker per session: Reading -> Writing -> Reading, exiting to
/// Disconnected on hang-up, I/O failure, or a decode error.
pub(crate) async fn run_session(daemon: Arc<Daemon>, mut stream: UnixStream, session: Arc<Session>) {
    let mut decoder = Decoder::new();
    let mut chunk = vec![0u8; 8192];

    loop {
        tokio::select! {
            // Biased polling keeps the read arm ahead of the wakeup when
            // both are ready.
            biased;

            read = stream.read(&mut chunk) => match read {
                // Peer hang-up.
                Ok(0) => break,
                Ok(n) => {
                    decoder.feed(&chunk[..n]);
                    loop {
                        match decoder.next_request() {
                            Ok(Some((request, format))) => {
                                // Responses mirror the request's encoding.
                                session.set_format(format);
                                dispatch(&daemon, &session, &request);
                            }
                            Ok(None) => break,
                            Err(e) => {
                                error!(session = session.id(), "invalid data from client: {}", e.reason);
                                session.send_error(&e);
                                // Flush the decode error, then drop the
                                // connection.
                                let _ = drain_outbound(&session, &mut stream).await;
                                daemon.sessions.remove(session.id());
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    debug!(session = session.id(), error = %e, "read error");
                    break;
                }
            },
            _ = session.notified() => {}
        }

        if drain_outbound(&session, &mut stream).await.is_err() {
            break;
        }
    }

    daemon.sessions.remove(session.id());
    debug!(session = session.id(), "client disconnected");
}

/// Pop and write queued responses one at a time. The queue lock is never
/// held across the write.
async fn drain_outbound(session: &Session, stream: &mut UnixStream) -> std::io::Result<()> {
    while let Some(response) = session.pop_response() {
        let bytes = match wire::encode(&response, session.format()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(session = session.id(), error = %e, "dropping unencodable response");
                continue;
            }
        };
        stream.write_all(&bytes).await?;
    }
    Ok(())
}
