//! Decode failures: an error response, then the connection drops.

use serde_json::json;

use crate::prelude::*;

#[tokio::test]
async fn malformed_json_gets_an_error_then_disconnect() {
    let td = start_daemon().await;
    let mut client = Client::connect(&td.config).await;

    client.send_raw(b"{this is not json}\n").await;

    let response = client.recv().await;
    let error = response["error"].as_str().unwrap();
    assert!(error.starts_with("invalid json at position"), "got: {error}");

    client.expect_eof().await;
}

#[tokio::test]
async fn a_decode_error_does_not_affect_other_sessions() {
    let td = start_daemon().await;
    let mut bad = Client::connect(&td.config).await;
    let mut good = Client::connect(&td.config).await;

    bad.send_raw(b"]]]]\n").await;
    bad.recv().await;
    bad.expect_eof().await;

    let response = good.roundtrip(json!(["version"])).await;
    assert!(response.get("error").is_none());
}
