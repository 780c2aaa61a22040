use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chain::TranslationInput;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /chain/invoke` and `POST /chain/stream`.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub input: TranslationInput,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub kwargs: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub output: String,
    pub metadata: RunMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
}

/// Body of `POST /chain/batch`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    pub inputs: Vec<TranslationInput>,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub kwargs: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub output: Vec<String>,
    pub metadata: BatchMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub run_ids: Vec<Uuid>,
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/chain/invoke", post(invoke))
        .route("/chain/batch", post(batch))
        .route("/chain/stream", post(stream))
        .route("/chain/input_schema", get(input_schema))
        .route("/chain/output_schema", get(output_schema))
        .route("/chain/config_schema", get(config_schema))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.chain.model_name()
    }))
}

async fn invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let Json(request) = payload?;
    let run_id = Uuid::new_v4();
    info!(%run_id, language = %request.input.language, "Invoke");
    debug!("config={} kwargs={}", request.config, request.kwargs);

    let output = state.chain.invoke(&request.input).await?;
    Ok(Json(InvokeResponse {
        output,
        metadata: RunMetadata { run_id },
    }))
}

async fn batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(request) = payload?;
    let run_ids: Vec<Uuid> = request.inputs.iter().map(|_| Uuid::new_v4()).collect();
    info!("Batch of {} inputs", request.inputs.len());

    let output = state.chain.batch(&request.inputs).await?;
    Ok(Json(BatchResponse {
        output,
        metadata: BatchMetadata { run_ids },
    }))
}

/// Streams `data` events with JSON-encoded text chunks, then a single `end` event.
/// A failure after the stream has started is reported as an `error` event.
async fn stream(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload?;
    let run_id = Uuid::new_v4();
    info!(%run_id, language = %request.input.language, "Stream");

    let chunks = state.chain.stream(&request.input).await?;

    let metadata = futures::stream::once(async move {
        Event::default()
            .event("metadata")
            .data(json!({ "run_id": run_id }).to_string())
    });
    let body = chunks.map(|item| match item {
        Ok(chunk) => Event::default()
            .event("data")
            .data(Value::String(chunk).to_string()),
        Err(e) => Event::default().event("error").data(
            json!({
                "status_code": 500,
                "message": e.to_string()
            })
            .to_string(),
        ),
    });
    let end = futures::stream::once(async { Event::default().event("end") });

    let events = metadata.chain(body).chain(end).map(Ok);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn input_schema(State(state): State<AppState>) -> Json<Value> {
    Json(state.chain.input_schema())
}

async fn output_schema(State(state): State<AppState>) -> Json<Value> {
    Json(state.chain.output_schema())
}

async fn config_schema(State(state): State<AppState>) -> Json<Value> {
    Json(state.chain.config_schema())
}
