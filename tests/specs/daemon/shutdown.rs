//! `shutdown-server` teardown, in-process.

use serde_json::json;

use crate::prelude::*;

#[tokio::test]
async fn shutdown_stops_the_run_loop_and_unbinds_the_socket() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    // No response document is produced for shutdown-server.
    client.send(json!(["shutdown-server"])).await;

    td.run.await.unwrap().unwrap();
    assert!(!td.config.socket_path.exists());

    // No further connections are accepted.
    let refused = tokio::net::UnixStream::connect(&td.config.socket_path).await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn shutdown_frees_the_watched_roots() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;
    assert_eq!(td.daemon.engine.watch_list().len(), 1);

    client.send(json!(["shutdown-server"])).await;
    td.run.await.unwrap().unwrap();

    assert!(td.daemon.engine.watch_list().is_empty());
    // The shutting-down session deregistered itself in the handler.
    assert!(td.daemon.sessions.is_empty());
}
