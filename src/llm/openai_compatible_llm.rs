use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::Stream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::stateless_llm_interface::{LlmError, LlmStream, StatelessLLMInterface};
use crate::prompt::ChatMessage;

/// OpenAI compatible LLM implementation (Groq, OpenAI and friends)
pub struct OpenAICompatibleLLM {
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: Option<u32>,
    http_client: Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ProviderError>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ProviderErrorResponse {
    error: ProviderError,
}

#[derive(Deserialize, Debug)]
struct ProviderError {
    message: String,
}

impl OpenAICompatibleLLM {
    pub fn new(
        model: String,
        base_url: String,
        api_key: &str,
        temperature: f32,
        max_tokens: Option<u32>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}",
            model, base_url
        );

        Ok(Self {
            model,
            base_url,
            temperature,
            max_tokens,
            http_client,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        };

        debug!(
            "Sending chat completion: model={}, messages={}, stream={}",
            self.model,
            messages.len(),
            stream
        );
        let response = self.http_client.post(self.api_url()).json(&request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Map a non-2xx provider reply onto an [`LlmError`], preferring the provider's own message.
fn status_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ProviderErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    warn!("Model provider returned {}: {}", status, message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
            status: status.as_u16(),
            message,
        },
        _ => LlmError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self.send(messages, false).await?;
        let text = response.text().await?;
        let completion: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn chat_completion_stream(&self, messages: &[ChatMessage]) -> Result<LlmStream, LlmError> {
        let response = self.send(messages, true).await?;
        Ok(parse_event_stream(Box::pin(response.bytes_stream())).boxed())
    }
}

struct EventStreamState<S> {
    bytes: S,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, LlmError>>,
    finished: bool,
}

impl<S> EventStreamState<S> {
    /// Consume every complete line in the buffer.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                self.finished = true;
                self.buffer.clear();
                return;
            }

            match serde_json::from_str::<ChatCompletionChunk>(data) {
                Ok(chunk) => {
                    if let Some(error) = chunk.error {
                        // The provider already answered 200 before the stream failed.
                        self.pending.push_back(Err(LlmError::Upstream {
                            status: StatusCode::OK.as_u16(),
                            message: error.message,
                        }));
                        self.finished = true;
                        self.buffer.clear();
                        return;
                    }
                    let content = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .filter(|c| !c.is_empty());
                    if let Some(content) = content {
                        self.pending.push_back(Ok(content));
                    }
                }
                Err(e) => self.pending.push_back(Err(LlmError::Decode(e.to_string()))),
            }
        }
    }
}

/// Turn a server-sent-events body into content fragments.
///
/// Lines are split on raw bytes so multi-byte characters cut across network
/// chunks are decoded intact.
fn parse_event_stream<S, B>(bytes: S) -> impl Stream<Item = Result<String, LlmError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
{
    let state = EventStreamState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(chunk.as_ref());
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(LlmError::Transport(e)));
                }
                None => {
                    state.finished = true;
                    state.buffer.push(b'\n');
                    state.drain_lines();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;
    use crate::test_support::spawn_router;
    use axum::http::HeaderMap as AxumHeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use futures::TryStreamExt;
    use serde_json::{json, Value};

    fn llm(base_url: &str) -> OpenAICompatibleLLM {
        OpenAICompatibleLLM::new(
            "Gemma2-9b-It".to_string(),
            base_url.to_string(),
            "gsk_test",
            0.5,
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn prompt() -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(Role::System, "Translate the following into French:"),
            ChatMessage::new(Role::User, "Hello"),
        ]
    }

    async fn fake_completion(headers: AxumHeaderMap, Json(body): Json<Value>) -> axum::response::Response {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer gsk_test") {
            return (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error"}})),
            )
                .into_response();
        }
        assert_eq!(body["model"], "Gemma2-9b-It");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");

        if body["stream"] == true {
            let sse = concat!(
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Bon\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"jour\"}}]}\n\n",
                "data: [DONE]\n\n",
            );
            return ([("content-type", "text/event-stream")], sse).into_response();
        }

        Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Bonjour"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
        }))
        .into_response()
    }

    fn fake_provider() -> Router {
        Router::new().route("/openai/v1/chat/completions", post(fake_completion))
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let base = spawn_router(fake_provider()).await;
        let reply = llm(&format!("{}/openai/v1/", base))
            .chat_completion(&prompt())
            .await
            .unwrap();
        assert_eq!(reply, "Bonjour");
    }

    #[tokio::test]
    async fn bad_key_is_an_authentication_error() {
        let base = spawn_router(fake_provider()).await;
        let llm = OpenAICompatibleLLM::new(
            "Gemma2-9b-It".to_string(),
            format!("{}/openai/v1", base),
            "wrong",
            1.0,
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let err = llm.chat_completion(&prompt()).await.unwrap_err();
        match err {
            LlmError::Authentication { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn streams_delta_fragments() {
        let base = spawn_router(fake_provider()).await;
        let stream = llm(&format!("{}/openai/v1", base))
            .chat_completion_stream(&prompt())
            .await
            .unwrap();
        let parts: Vec<String> = stream.try_collect().await.unwrap();
        assert_eq!(parts, vec!["Bon", "jour"]);
    }

    #[tokio::test]
    async fn server_errors_are_upstream_errors() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "over capacity") }),
        );
        let base = spawn_router(router).await;

        let err = llm(&base).chat_completion(&prompt()).await.unwrap_err();
        assert!(matches!(err, LlmError::Upstream { status: 503, ref message } if message == "over capacity"));
    }

    #[tokio::test]
    async fn event_stream_handles_split_multibyte_characters() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"नमस्ते\"}}]}\n".as_bytes();
        let (head, tail) = line.split_at(line.len() - 8);
        let chunks = vec![head.to_vec(), tail.to_vec(), b"data: [DONE]\n".to_vec()];

        let parts: Vec<String> = parse_event_stream(futures::stream::iter(
            chunks.into_iter().map(Ok::<_, reqwest::Error>),
        ))
        .try_collect()
        .await
        .unwrap();
        assert_eq!(parts, vec!["नमस्ते"]);
    }

    #[tokio::test]
    async fn event_stream_surfaces_inline_errors() {
        let chunks = vec![b"data: {\"error\":{\"message\":\"rate limited\"}}\n".to_vec()];
        let items: Vec<Result<String, LlmError>> =
            parse_event_stream(futures::stream::iter(chunks.into_iter().map(Ok::<_, reqwest::Error>)))
                .collect()
                .await;
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(LlmError::Upstream { message, .. }) if message == "rate limited"));
    }
}
