//! Request handlers: one call per parsed `ClientRequest`.
//!
//! Every handler answers with at least one response carrying the request id. Service
//! errors become `error` responses; only a send failure is returned as `Err`.

use tokio_util::sync::CancellationToken;
use vectorizer::catalog;
use vectorizer::protocol::{
    ClientRequest, EmbedManyRequest, EmbedOneRequest, EmbeddingResponse, EmbeddingsResponse,
    HealthResponse, LookupModelRequest, ModelDetailsResponse, ServerResponse,
};
use vectorizer::{EmbedError, EmbedOptions, EmbeddingService, ModelType};

use crate::delivery::{deliver_stream, ResponseSender};

type SendResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Per-request options: optional model (a raw `model_url` wins over a catalog `model`)
/// plus the connection's cancellation token.
fn embed_options(
    model: Option<&str>,
    model_url: Option<&str>,
    cancel: &CancellationToken,
) -> Result<EmbedOptions, EmbedError> {
    let options = EmbedOptions::default().with_cancel(cancel.clone());
    match (model_url, model) {
        (Some(url), _) => Ok(options.with_model_url(url)),
        (None, Some(name)) => Ok(options.with_model(name.parse::<ModelType>()?)),
        (None, None) => Ok(options),
    }
}

pub(crate) async fn handle_request<S>(
    service: &EmbeddingService,
    request: ClientRequest,
    sender: &S,
    cancel: &CancellationToken,
) -> SendResult
where
    S: ResponseSender + ?Sized,
{
    match request {
        ClientRequest::EmbedOne(r) => handle_embed_one(service, r, sender, cancel).await,
        ClientRequest::EmbedMany(r) => handle_embed_many(service, r, sender, cancel).await,
        ClientRequest::EmbedManyStream(r) => {
            handle_embed_many_stream(service, r, sender, cancel).await
        }
        ClientRequest::LookupModel(r) => sender.send_response(handle_lookup(r)).await,
        ClientRequest::HealthCheck(r) => {
            sender
                .send_response(ServerResponse::Health(HealthResponse {
                    id: r.id,
                    status: service.health_check().to_string(),
                }))
                .await
        }
    }
}

async fn handle_embed_one<S>(
    service: &EmbeddingService,
    r: EmbedOneRequest,
    sender: &S,
    cancel: &CancellationToken,
) -> SendResult
where
    S: ResponseSender + ?Sized,
{
    let result = match embed_options(r.model.as_deref(), r.model_url.as_deref(), cancel) {
        Ok(options) => service.embed_one_with(&r.text, &options).await,
        Err(e) => Err(e),
    };
    let response = match result {
        Ok(embedding) => ServerResponse::Embedding(EmbeddingResponse {
            id: r.id,
            embedding,
        }),
        Err(e) => ServerResponse::from_error(Some(r.id), &e),
    };
    sender.send_response(response).await
}

async fn handle_embed_many<S>(
    service: &EmbeddingService,
    r: EmbedManyRequest,
    sender: &S,
    cancel: &CancellationToken,
) -> SendResult
where
    S: ResponseSender + ?Sized,
{
    let result = match embed_options(r.model.as_deref(), r.model_url.as_deref(), cancel) {
        Ok(options) => service.embed_many_with(r.texts, &options).await,
        Err(e) => Err(e),
    };
    let response = match result {
        Ok(embeddings) => ServerResponse::Embeddings(EmbeddingsResponse {
            id: r.id,
            embeddings,
        }),
        Err(e) => ServerResponse::from_error(Some(r.id), &e),
    };
    sender.send_response(response).await
}

async fn handle_embed_many_stream<S>(
    service: &EmbeddingService,
    r: EmbedManyRequest,
    sender: &S,
    cancel: &CancellationToken,
) -> SendResult
where
    S: ResponseSender + ?Sized,
{
    let stream = match embed_options(r.model.as_deref(), r.model_url.as_deref(), cancel) {
        Ok(options) => service.embed_many_streaming_with(r.texts, &options).await,
        Err(e) => Err(e),
    };
    match stream {
        Ok(stream) => deliver_stream(&r.id, stream, sender).await,
        Err(e) => {
            sender
                .send_response(ServerResponse::from_error(Some(r.id), &e))
                .await
        }
    }
}

fn handle_lookup(r: LookupModelRequest) -> ServerResponse {
    match catalog::lookup(&r.model_type) {
        Ok(d) => ServerResponse::ModelDetails(ModelDetailsResponse {
            id: r.id,
            model_type: d.identifier.to_string(),
            model_name: d.display_name.to_string(),
            url: d.source_uri.to_string(),
            response_time: chrono::Utc::now().timestamp(),
        }),
        Err(e) => ServerResponse::from_error(Some(r.id), &e),
    }
}
