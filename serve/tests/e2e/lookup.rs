use super::common;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use vectorizer::protocol::{ClientRequest, LookupModelRequest, ServerResponse};

#[tokio::test]
async fn e2e_lookup_known_and_unknown_model() {
    let (url, _service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = ClientRequest::LookupModel(LookupModelRequest {
        id: "lookup-1".to_string(),
        model_type: "MSMARCO_MINILM_L_6_V3".to_string(),
    });
    let (resp, received) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    assert!(received.contains("\"type\":\"model_details\""), "received: {}", received);
    match &resp {
        ServerResponse::ModelDetails(d) => {
            assert_eq!(d.id, "lookup-1");
            assert_eq!(d.model_name, "msmarco-MiniLM-L-6-v3");
            assert_eq!(
                d.url,
                "djl://ai.djl.huggingface.pytorch/sentence-transformers/msmarco-MiniLM-L-6-v3"
            );
            assert!(d.response_time > 0);
        }
        _ => panic!("expected ModelDetails, got {:?}", resp),
    }

    let req = ClientRequest::LookupModel(LookupModelRequest {
        id: "lookup-2".to_string(),
        model_type: "GPT_9000".to_string(),
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    match &resp {
        ServerResponse::Error(e) => {
            assert_eq!(e.id.as_deref(), Some("lookup-2"));
            assert_eq!(e.kind.as_deref(), Some("not_found"));
        }
        _ => panic!("expected Error, got {:?}", resp),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
