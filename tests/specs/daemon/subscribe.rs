//! Subscription pushes interleaved with request/response traffic.

use serde_json::json;

use vigil_core::FileMeta;
use vigil_engine::Change;

use crate::prelude::*;

#[tokio::test]
async fn subscribe_delivers_the_initial_set_then_deltas() {
    let td = start_daemon().await;
    let root_dir = tempfile::tempdir().unwrap();
    std::fs::write(root_dir.path().join("seed.txt"), "x").unwrap();
    let path = root_dir.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;
    client.send(json!(["subscribe", path, "everything"])).await;

    // Initial result set arrives ahead of the confirmation.
    let push = client.recv().await;
    assert_eq!(push["subscription"], "everything");
    assert_eq!(push["is_fresh_instance"], true);
    assert_eq!(push["files"].as_array().unwrap().len(), 1);

    let response = client.recv().await;
    assert_eq!(response["subscribe"], "everything");

    // Feed a change through the engine seam; the wakeup channel gets the
    // push onto the wire without any request from this client.
    let canonical = root_dir.path().canonicalize().unwrap();
    let watched = td.daemon.engine.get(&canonical).unwrap();
    td.daemon.engine.record_changes(
        &watched,
        &[Change::Updated {
            name: "delta.txt".to_string(),
            meta: FileMeta::default(),
        }],
    );

    let push = client.recv().await;
    assert_eq!(push["subscription"], "everything");
    assert_eq!(push["is_fresh_instance"], false);
    let files = push["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "delta.txt");
}

#[tokio::test]
async fn unsubscribed_sessions_stop_receiving() {
    let td = start_daemon().await;
    let root_dir = tempfile::tempdir().unwrap();
    let path = root_dir.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;
    client.send(json!(["subscribe", path, "s"])).await;
    client.recv().await; // initial push
    client.recv().await; // confirmation

    let response = client.roundtrip(json!(["unsubscribe", path, "s"])).await;
    assert_eq!(response["deleted"], true);

    let canonical = root_dir.path().canonicalize().unwrap();
    let watched = td.daemon.engine.get(&canonical).unwrap();
    td.daemon.engine.record_changes(
        &watched,
        &[Change::Updated {
            name: "ignored.txt".to_string(),
            meta: FileMeta::default(),
        }],
    );

    // The next thing the client hears must be its own response, not a
    // stale push.
    let response = client.roundtrip(json!(["version"])).await;
    assert!(response.get("subscription").is_none());
}
