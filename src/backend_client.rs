use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::chain::{TranslationInput, Translator};
use crate::session::SessionHistory;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not reach translation server: {0}")]
    Connection(String),

    #[error("Translation server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response from translation server: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Connection(e.to_string())
        }
    }
}

/// Wire body of `POST /chain/invoke`.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeBody {
    pub input: TranslationInput,
    pub config: Value,
    pub kwargs: Value,
}

impl InvokeBody {
    pub fn new(text: &str, language: &str) -> Self {
        Self {
            input: TranslationInput::new(text, language),
            config: json!({}),
            kwargs: json!({}),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InvokeReply {
    output: String,
}

/// HTTP client for the translation server.
#[derive(Debug, Clone)]
pub struct TranslationServiceClient {
    client: Client,
    base_url: String,
}

impl TranslationServiceClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn invoke(&self, text: &str, language: &str) -> Result<String, ClientError> {
        let url = format!("{}/chain/invoke", self.base_url);
        debug!("POST {} language={}", url, language);

        let response = self
            .client
            .post(&url)
            .json(&InvokeBody::new(text, language))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: InvokeReply = response.json().await?;
        Ok(reply.output)
    }

    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Translator for TranslationServiceClient {
    type Error = ClientError;

    async fn translate(&self, text: &str, language: &str) -> Result<String, ClientError> {
        self.invoke(text, language).await
    }
}

/// Outcome of one UI submission.
#[derive(Debug)]
pub struct TranslationOutcome {
    /// The translated text, or empty on failure.
    pub translation: String,
    /// Inline message to show the user when the call failed.
    pub error: Option<String>,
}

/// Translate once and record a successful result in `history`.
///
/// Failures are logged and reported through [`TranslationOutcome::error`];
/// the returned text is then empty and `history` is left untouched.
pub async fn get_translation<T>(
    translator: &T,
    history: &mut SessionHistory,
    text: &str,
    language: &str,
) -> TranslationOutcome
where
    T: Translator + ?Sized,
{
    match translator.translate(text, language).await {
        Ok(translation) => {
            if !translation.is_empty() {
                history.push(text, &translation, language);
            }
            TranslationOutcome {
                translation,
                error: None,
            }
        }
        Err(e) => {
            error!("Translation request failed: {}", e);
            TranslationOutcome {
                translation: String::new(),
                error: Some(format!("An error occurred: {}", e)),
            }
        }
    }
}
