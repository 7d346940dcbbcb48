use super::common;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use vectorizer::protocol::{ClientRequest, EmbedManyRequest, EmbedOneRequest, ServerResponse};

#[tokio::test]
async fn e2e_embed_one_and_many() {
    let (url, service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = ClientRequest::EmbedOne(EmbedOneRequest {
        id: "one-1".to_string(),
        text: "the quick brown fox".to_string(),
        model: None,
        model_url: None,
    });
    let (resp, received) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    assert!(received.contains("\"type\":\"embedding\""), "received: {}", received);
    let single = match resp {
        ServerResponse::Embedding(e) => {
            assert_eq!(e.id, "one-1");
            e.embedding
        }
        other => panic!("expected Embedding, got {:?}", other),
    };
    assert_eq!(single.len(), common::DIMENSION);

    let texts: Vec<String> = (0..7).map(|i| format!("sentence number {}", i)).collect();
    let req = ClientRequest::EmbedMany(EmbedManyRequest {
        id: "many-1".to_string(),
        texts: texts.clone(),
        model: None,
        model_url: None,
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    match resp {
        ServerResponse::Embeddings(e) => {
            assert_eq!(e.id, "many-1");
            assert_eq!(e.embeddings.len(), texts.len());
            for (text, vector) in texts.iter().zip(&e.embeddings) {
                assert_eq!(vector, &service.embed_one(text).await.unwrap());
            }
        }
        other => panic!("expected Embeddings, got {:?}", other),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

/// **Scenario**: several embed_one requests on one connection each get exactly one reply.
#[tokio::test]
async fn e2e_concurrent_embed_one_requests() {
    let (url, service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    for i in 0..6 {
        let req = ClientRequest::EmbedOne(EmbedOneRequest {
            id: format!("c{}", i),
            text: format!("text {}", i),
            model: None,
            model_url: None,
        });
        common::send(&mut write, &req).await.unwrap();
    }
    let mut replies = HashMap::new();
    for _ in 0..6 {
        let (resp, _) = common::recv(&mut read).await.unwrap();
        match resp {
            ServerResponse::Embedding(e) => {
                assert!(replies.insert(e.id, e.embedding).is_none(), "duplicate reply");
            }
            other => panic!("expected Embedding, got {:?}", other),
        }
    }
    for i in 0..6 {
        let expected = service.embed_one(&format!("text {}", i)).await.unwrap();
        assert_eq!(replies[&format!("c{}", i)], expected);
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

#[tokio::test]
async fn e2e_embed_with_catalog_model() {
    let (url, service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = ClientRequest::EmbedOne(EmbedOneRequest {
        id: "m1".to_string(),
        text: "hello from a different model entirely".to_string(),
        model: Some("E5_BASE_V2".to_string()),
        model_url: None,
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    let with_model = match resp {
        ServerResponse::Embedding(e) => e.embedding,
        other => panic!("expected Embedding, got {:?}", other),
    };
    let default = service
        .embed_one("hello from a different model entirely")
        .await
        .unwrap();
    assert_ne!(with_model, default, "catalog model should differ from the default model");
    assert!(service
        .registry()
        .is_loaded("djl://ai.djl.huggingface.pytorch/sentence-transformers/e5-base-v2"));

    let req = ClientRequest::EmbedMany(EmbedManyRequest {
        id: "m2".to_string(),
        texts: vec!["hello".to_string()],
        model: Some("NO_SUCH_MODEL".to_string()),
        model_url: None,
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    match resp {
        ServerResponse::Error(e) => {
            assert_eq!(e.id.as_deref(), Some("m2"));
            assert_eq!(e.kind.as_deref(), Some("not_found"));
        }
        other => panic!("expected Error, got {:?}", other),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

/// **Scenario**: a raw `model_url` is loaded on demand and shared by later requests.
#[tokio::test]
async fn e2e_embed_with_model_url() {
    let (url, service, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let model_url = "hash://models.example/custom-encoder";
    let text = "embedding with a model given by url";
    let req = ClientRequest::EmbedOne(EmbedOneRequest {
        id: "u1".to_string(),
        text: text.to_string(),
        model: None,
        model_url: Some(model_url.to_string()),
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    let first = match resp {
        ServerResponse::Embedding(e) => e.embedding,
        other => panic!("expected Embedding, got {:?}", other),
    };
    assert!(service.registry().is_loaded(model_url));
    assert_ne!(first, service.embed_one(text).await.unwrap());

    let req = ClientRequest::EmbedMany(EmbedManyRequest {
        id: "u2".to_string(),
        texts: vec![text.to_string()],
        model: None,
        model_url: Some(model_url.to_string()),
    });
    let (resp, _) = common::send_and_recv(&mut write, &mut read, &req).await.unwrap();
    match resp {
        ServerResponse::Embeddings(e) => assert_eq!(e.embeddings, vec![first]),
        other => panic!("expected Embeddings, got {:?}", other),
    }

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
