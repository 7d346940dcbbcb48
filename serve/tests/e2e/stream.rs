use super::common;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use vectorizer::protocol::{ClientRequest, EmbedManyRequest, ServerResponse};

/// **Scenario**: a streamed request yields every index exactly once, then stream_end.
#[tokio::test]
async fn e2e_embed_many_stream_is_complete() {
    let (url, service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let texts: Vec<String> = (0..10).map(|i| format!("streamed text {}", i)).collect();
    let req = ClientRequest::EmbedManyStream(EmbedManyRequest {
        id: "s1".to_string(),
        texts: texts.clone(),
        model: None,
        model_url: None,
    });
    common::send(&mut write, &req).await.unwrap();

    let mut seen = vec![0usize; texts.len()];
    loop {
        let (resp, _) = common::recv(&mut read).await.unwrap();
        match resp {
            ServerResponse::EmbeddingsPartial(p) => {
                assert_eq!(p.id, "s1");
                for (index, vector) in p.indices.iter().zip(&p.embeddings) {
                    seen[*index] += 1;
                    assert_eq!(vector, &service.embed_one(&texts[*index]).await.unwrap());
                }
            }
            ServerResponse::StreamEnd(end) => {
                assert_eq!(end.id, "s1");
                assert_eq!(end.delivered, texts.len());
                assert_eq!(end.failed, 0);
                break;
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
    assert!(seen.iter().all(|&n| n == 1), "index counts: {:?}", seen);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

#[tokio::test]
async fn e2e_embed_many_stream_empty_batch() {
    let (url, _service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = ClientRequest::EmbedManyStream(EmbedManyRequest {
        id: "s-empty".to_string(),
        texts: Vec::new(),
        model: None,
        model_url: None,
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    match resp {
        ServerResponse::StreamEnd(end) => assert_eq!((end.delivered, end.failed), (0, 0)),
        other => panic!("expected StreamEnd, got {:?}", other),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
