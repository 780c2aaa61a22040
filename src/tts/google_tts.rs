use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::interface::{TTSInterface, TtsError};
use crate::utils::sentence_divider::{split_into_chunks, MAX_CHUNK_CHARS};
use crate::utils::tts_preprocessor::tts_filter;

/// Speech synthesis through Google Translate's `translate_tts` endpoint, as gTTS does.
pub struct GoogleTTS {
    base_url: String,
    slow: bool,
    client: Client,
}

impl GoogleTTS {
    pub fn new(base_url: String, slow: bool, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; lcel-translate)")
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Initialized GoogleTTS: base_url={}, slow={}", base_url, slow);
        Ok(Self {
            base_url,
            slow,
            client,
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        lang_code: &str,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/translate_tts", self.base_url);
        let speed = if self.slow { "0.24" } else { "1" };
        let textlen = chunk.chars().count().to_string();
        let total = total.to_string();
        let idx = index.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang_code),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("ttsspeed", speed),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::Status {
                status: status.as_u16(),
                index,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TTSInterface for GoogleTTS {
    async fn generate_audio(&self, text: &str, lang_code: &str) -> Result<Vec<u8>, TtsError> {
        let cleaned = tts_filter(text);
        let chunks = split_into_chunks(&cleaned, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::EmptyText);
        }

        debug!("Synthesizing {} chunk(s) in '{}'", chunks.len(), lang_code);
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, lang_code, index, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    async fn fake_speech_service() -> String {
        let router = Router::new().route(
            "/translate_tts",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                format!("[{}:{}:{}]", params["tl"], params["idx"], params["q"])
            }),
        );
        spawn_router(router).await
    }

    fn tts(base: &str) -> GoogleTTS {
        GoogleTTS::new(base.to_string(), false, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn concatenates_chunks_in_order() {
        let base = fake_speech_service().await;

        let audio = tts(&base).generate_audio("Bonjour. Au revoir!", "fr").await.unwrap();

        assert_eq!(
            String::from_utf8(audio).unwrap(),
            "[fr:0:Bonjour.][fr:1:Au revoir!]"
        );
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_a_request() {
        let err = tts("http://127.0.0.1:9").generate_audio(" ** ", "fr").await.unwrap_err();
        assert!(matches!(err, TtsError::EmptyText));
    }

    #[tokio::test]
    async fn service_errors_name_the_chunk() {
        let router = Router::new().route(
            "/translate_tts",
            get(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = spawn_router(router).await;

        let err = tts(&base).generate_audio("Hallo", "de").await.unwrap_err();
        assert!(matches!(err, TtsError::Status { status: 429, index: 0 }));
    }
}
