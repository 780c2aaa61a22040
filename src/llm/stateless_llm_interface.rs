use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::prompt::ChatMessage;

/// Stream of text fragments produced by a streaming completion.
pub type LlmStream = BoxStream<'static, Result<String, LlmError>>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication with the model provider failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Model provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Failed to decode model response: {0}")]
    Decode(String),
}

/// Interface for a stateless language model
/// Stateless means the LLM doesn't store memory, system prompts, or user messages
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Model identifier, for logs and the health endpoint.
    fn model_name(&self) -> &str;

    /// Run a chat completion and return the full reply.
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Run a chat completion and return the reply as it is generated.
    async fn chat_completion_stream(&self, messages: &[ChatMessage]) -> Result<LlmStream, LlmError>;
}
