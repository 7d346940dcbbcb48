use super::common;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use vectorizer::protocol::{ClientRequest, HealthCheckRequest, ServerResponse};

#[tokio::test]
async fn e2e_health_check() {
    let (url, _service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = ClientRequest::HealthCheck(HealthCheckRequest {
        id: "health-1".to_string(),
    });
    let (resp, received) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();

    assert!(
        received.contains("\"type\":\"health\"") && received.contains("\"id\":\"health-1\""),
        "expected health response, received: {}",
        received
    );
    match &resp {
        ServerResponse::Health(h) => assert_eq!(h.status, "EmbeddingService is running"),
        _ => panic!("expected Health, got {:?}", resp),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
