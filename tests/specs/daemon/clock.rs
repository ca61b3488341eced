//! Clock and cursor semantics over the socket.

use serde_json::json;

use vigil_core::parse_clock_id;

use crate::prelude::*;

#[tokio::test]
async fn clock_is_stable_across_reads() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;

    let first = client.roundtrip(json!(["clock", path])).await;
    let second = client.roundtrip(json!(["clock", path])).await;
    assert_eq!(first["clock"], second["clock"]);

    let (pid, _ticks) = parse_clock_id(first["clock"].as_str().unwrap()).unwrap();
    assert_eq!(pid, std::process::id() as i32);
}

#[tokio::test]
async fn cursor_liveness_across_sequential_sessions() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("present.txt"), "x").unwrap();
    let path = root.path().to_str().unwrap();

    {
        let mut first = Client::connect(&td.config).await;
        first.roundtrip(json!(["watch", path])).await;

        let response = first.roundtrip(json!(["since", path, "n:cur"])).await;
        assert_eq!(response["is_fresh_instance"], true);
        assert_eq!(response["files"].as_array().unwrap().len(), 1);
    }

    // The cursor's position survives the session that created it.
    let mut second = Client::connect(&td.config).await;
    let response = second.roundtrip(json!(["since", path, "n:cur"])).await;
    assert_eq!(response["is_fresh_instance"], false);
    assert!(response["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn equal_clock_id_forces_the_tick_forward() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;

    let clock = client.roundtrip(json!(["clock", path])).await;
    let clock_str = clock["clock"].as_str().unwrap().to_string();
    let (_pid, ticks) = parse_clock_id(&clock_str).unwrap();

    let response = client.roundtrip(json!(["since", path, clock_str])).await;
    let (_pid, after) = parse_clock_id(response["clock"].as_str().unwrap()).unwrap();
    assert_eq!(after, ticks + 1);
    assert!(response["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn foreign_incarnation_clock_ids_read_as_fresh() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), "x").unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;

    // A pid that cannot be ours: a different incarnation of the server.
    let foreign = format!("c:{}:42", std::process::id() + 1);
    let response = client.roundtrip(json!(["since", path, foreign])).await;
    assert_eq!(response["is_fresh_instance"], true);
    assert_eq!(response["files"].as_array().unwrap().len(), 1);
}
