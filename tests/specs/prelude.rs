//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use vigil_daemon::{Config, Daemon, Server, ServerError};

/// Upper bound on any single protocol exchange in a spec.
pub const SPEC_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// An in-process daemon rooted in its own scratch state directory.
pub struct TestDaemon {
    pub config: Config,
    pub daemon: Arc<Daemon>,
    pub run: tokio::task::JoinHandle<Result<(), ServerError>>,
    _state_dir: tempfile::TempDir,
}

pub async fn start_daemon() -> TestDaemon {
    let state_dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(state_dir.path().to_path_buf());
    let server = Server::start(config.clone()).await.unwrap();
    let daemon = server.daemon();
    let run = tokio::spawn(server.run());

    TestDaemon {
        config,
        daemon,
        run,
        _state_dir: state_dir,
    }
}

/// A protocol client speaking newline-delimited JSON (with framed
/// variants available for the mirroring specs).
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(config: &Config) -> Client {
        let stream = UnixStream::connect(&config.socket_path).await.unwrap();
        let (read, writer) = stream.into_split();
        Client {
            reader: BufReader::new(read),
            writer,
        }
    }

    pub async fn send(&mut self, request: serde_json::Value) {
        let mut line = serde_json::to_vec(&request).unwrap();
        line.push(b'\n');
        self.writer.write_all(&line).await.unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    pub async fn recv(&mut self) -> serde_json::Value {
        let mut line = String::new();
        let n = tokio::time::timeout(SPEC_IO_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a response")
            .unwrap();
        assert_ne!(n, 0, "connection closed while waiting for a response");
        serde_json::from_str(line.trim()).unwrap()
    }

    pub async fn roundtrip(&mut self, request: serde_json::Value) -> serde_json::Value {
        self.send(request).await;
        self.recv().await
    }

    pub async fn send_framed(&mut self, request: serde_json::Value) {
        let payload = serde_json::to_vec(&request).unwrap();
        let mut bytes = (payload.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(&payload);
        self.writer.write_all(&bytes).await.unwrap();
    }

    pub async fn recv_framed(&mut self) -> serde_json::Value {
        let mut prefix = [0u8; 4];
        tokio::time::timeout(SPEC_IO_TIMEOUT, self.reader.read_exact(&mut prefix))
            .await
            .expect("timed out waiting for a framed response")
            .unwrap();
        let len = u32::from_be_bytes(prefix) as usize;
        let mut payload = vec![0u8; len];
        tokio::time::timeout(SPEC_IO_TIMEOUT, self.reader.read_exact(&mut payload))
            .await
            .expect("timed out reading a framed payload")
            .unwrap();
        serde_json::from_slice(&payload).unwrap()
    }

    /// Assert the server closes the connection.
    pub async fn expect_eof(&mut self) {
        let mut line = String::new();
        let n = tokio::time::timeout(SPEC_IO_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for EOF")
            .unwrap();
        assert_eq!(n, 0, "expected EOF, got: {line}");
    }
}
