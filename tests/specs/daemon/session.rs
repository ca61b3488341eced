//! Session and envelope behavior over the socket.

use serde_json::json;

use crate::prelude::*;

#[tokio::test]
async fn unknown_command_is_answered_and_the_session_survives() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!(["nope"])).await;
    assert_eq!(response["error"], "unknown command nope");
    assert!(response["version"].is_string());

    // Still usable afterwards.
    let response = client.roundtrip(json!(["get-pid"])).await;
    assert_eq!(response["pid"], json!(std::process::id()));
}

#[tokio::test]
async fn empty_request_is_an_envelope_error() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!([])).await;
    assert_eq!(
        response["error"],
        "invalid command (expected an array with some elements!)"
    );
}

#[tokio::test]
async fn non_string_command_name_is_an_envelope_error() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!([1, 2, 3])).await;
    assert_eq!(
        response["error"],
        "invalid command: expected element 0 to be the command name"
    );
}

#[tokio::test]
async fn version_reports_the_build_string() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!(["version"])).await;
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.get("error").is_none());
}

#[tokio::test]
async fn get_sockname_reports_the_bound_path() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    let response = client.roundtrip(json!(["get-sockname"])).await;
    assert_eq!(
        response["sockname"],
        td.config.socket_path.to_string_lossy().into_owned().as_str()
    );
}

#[tokio::test]
async fn responses_mirror_the_framed_encoding() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    client.send_framed(json!(["get-pid"])).await;
    let response = client.recv_framed().await;
    assert_eq!(response["pid"], json!(std::process::id()));

    // Switching back to line JSON switches the responses back too.
    let response = client.roundtrip(json!(["version"])).await;
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let td = start_daemon().await;
    let mut a = Client::connect(&td.config).await;
    let mut b = Client::connect(&td.config).await;

    // Pipelined requests on one session do not leak onto the other.
    a.send(json!(["get-pid"])).await;
    a.send(json!(["version"])).await;
    let b_response = b.roundtrip(json!(["version"])).await;
    assert!(b_response.get("pid").is_none());

    let first = a.recv().await;
    let second = a.recv().await;
    assert!(first.get("pid").is_some());
    assert!(second.get("pid").is_none());
}
