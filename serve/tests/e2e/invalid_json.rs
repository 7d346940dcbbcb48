use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use vectorizer::protocol::{ClientRequest, HealthCheckRequest, ServerResponse};

use super::common;

#[tokio::test]
async fn e2e_invalid_json_returns_error() {
    let (url, _service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text("not valid json".to_string()))
        .await
        .unwrap();
    let (resp, received) = common::recv(&mut read).await.unwrap();

    assert!(
        received.contains("\"type\":\"error\"") && received.contains("parse error"),
        "expected error for invalid JSON, received: {}",
        received
    );
    match &resp {
        ServerResponse::Error(e) => {
            assert!(e.id.is_none());
            assert!(e.error.starts_with("parse error"));
        }
        _ => panic!("expected Error for invalid JSON, got {:?}", resp),
    }

    // The connection stays usable after a bad message.
    let req = ClientRequest::HealthCheck(HealthCheckRequest {
        id: "after".to_string(),
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    assert!(matches!(resp, ServerResponse::Health(ref h) if h.id == "after"));

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

#[tokio::test]
async fn e2e_unknown_request_type_returns_parse_error() {
    let (url, _service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(r#"{"type":"train","id":"t1"}"#.to_string()))
        .await
        .unwrap();
    let (resp, _) = common::recv(&mut read).await.unwrap();
    match &resp {
        ServerResponse::Error(e) => assert!(e.error.contains("parse error")),
        _ => panic!("expected Error, got {:?}", resp),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
