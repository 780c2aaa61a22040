use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use super::google_tts::GoogleTTS;
use super::interface::{TTSInterface, TtsError};
use crate::config_manager::TTSConfig;

/// Factory for creating TTS engines
pub struct TTSFactory;

impl TTSFactory {
    /// Create a TTS engine based on configuration
    pub fn create_tts(tts_config: &TTSConfig) -> Result<Arc<dyn TTSInterface>> {
        info!("Initializing TTS engine: {}", tts_config.tts_model);

        match tts_config.tts_model.as_str() {
            "gtts" | "google_tts" => Ok(Arc::new(GoogleTTS::new(
                tts_config.base_url.clone(),
                tts_config.slow,
                Duration::from_secs(tts_config.timeout_secs),
            )?)),
            other => Err(TtsError::Unsupported(other.to_string()).into()),
        }
    }
}
