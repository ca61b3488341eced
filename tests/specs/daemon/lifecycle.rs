//! Black-box lifecycle of the `vigild` binary: start, serve, exit 0.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use serde_json::json;

const STARTUP_WAIT: Duration = Duration::from_secs(10);

fn vigild() -> std::path::PathBuf {
    assert_cmd::cargo::cargo_bin("vigild")
}

#[test]
fn daemon_serves_and_exits_zero_on_shutdown() {
    let state_dir = tempfile::tempdir().unwrap();
    let socket_path = state_dir.path().join("vigild.sock");

    let mut child = std::process::Command::new(vigild())
        .env("VIGIL_STATE_DIR", state_dir.path())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    // Wait for the daemon to bind its socket.
    let deadline = Instant::now() + STARTUP_WAIT;
    let stream = loop {
        if let Ok(stream) = UnixStream::connect(&socket_path) {
            break stream;
        }
        assert!(
            Instant::now() < deadline,
            "daemon did not bind {} in time",
            socket_path.display()
        );
        assert!(
            child.try_wait().unwrap().is_none(),
            "daemon exited before binding its socket"
        );
        std::thread::sleep(Duration::from_millis(20));
    };

    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    // The pid on the wire is the child's, not ours.
    writeln!(writer, "{}", json!(["get-pid"])).unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let response: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(response["pid"], json!(child.id()));

    writeln!(writer, "{}", json!(["shutdown-server"])).unwrap();

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));
    assert!(!socket_path.exists());
}

#[test]
fn second_daemon_instance_refuses_to_start() {
    let state_dir = tempfile::tempdir().unwrap();
    let socket_path = state_dir.path().join("vigild.sock");

    let mut first = std::process::Command::new(vigild())
        .env("VIGIL_STATE_DIR", state_dir.path())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + STARTUP_WAIT;
    while UnixStream::connect(&socket_path).is_err() {
        assert!(Instant::now() < deadline, "first daemon did not start");
        std::thread::sleep(Duration::from_millis(20));
    }

    let second = std::process::Command::new(vigild())
        .env("VIGIL_STATE_DIR", state_dir.path())
        .output()
        .unwrap();
    assert_ne!(second.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&second.stderr).contains("already running"));

    // Shut the first down cleanly.
    let stream = UnixStream::connect(&socket_path).unwrap();
    let mut writer = stream.try_clone().unwrap();
    writeln!(writer, "{}", json!(["shutdown-server"])).unwrap();
    let status = first.wait().unwrap();
    assert_eq!(status.code(), Some(0));
}
