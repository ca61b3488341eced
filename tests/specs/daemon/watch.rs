//! Watch and trigger management over the socket.

use serde_json::json;

use crate::prelude::*;

#[tokio::test]
async fn watch_list_del_round_trip() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let canonical = root.path().canonicalize().unwrap();
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!(["watch", path])).await;
    assert_eq!(
        response["watch"],
        canonical.to_string_lossy().into_owned().as_str()
    );

    let response = client.roundtrip(json!(["watch-list"])).await;
    let roots = response["roots"].as_array().unwrap();
    assert_eq!(roots.len(), 1);

    let response = client.roundtrip(json!(["watch-del", path])).await;
    assert_eq!(response["watch-del"], true);

    let response = client.roundtrip(json!(["watch-list"])).await;
    assert!(response["roots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn find_sees_files_created_before_the_watch() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("hello.c"), "int x;").unwrap();
    std::fs::write(root.path().join("hello.txt"), "hi").unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;

    let response = client.roundtrip(json!(["find", path, "*.c"])).await;
    let files = response["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "hello.c");
    assert_eq!(files[0]["exists"], true);
    assert!(files[0]["size"].is_u64());
}

#[tokio::test]
async fn triggers_register_list_and_delete() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    client.roundtrip(json!(["watch", path])).await;

    let response = client
        .roundtrip(json!(["trigger", path, "build", "*.c", "--", "true"]))
        .await;
    assert_eq!(response["triggered"], "build");

    let response = client.roundtrip(json!(["trigger-list", path])).await;
    let triggers = response["triggers"].as_array().unwrap();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0]["name"], "build");

    let response = client.roundtrip(json!(["trigger-del", path, "build"])).await;
    assert_eq!(response["trigger-del"], true);

    let response = client.roundtrip(json!(["trigger-list", path])).await;
    assert!(response["triggers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unwatched_roots_resolve_to_errors() {
    let td = start_daemon().await;
    let root = tempfile::tempdir().unwrap();
    let path = root.path().to_str().unwrap();
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!(["clock", path])).await;
    let error = response["error"].as_str().unwrap();
    assert!(error.starts_with(&format!("unable to resolve root {path}: ")));
}
