use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("No text to speak")]
    EmptyText,

    #[error("Speech service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech service returned {status} for chunk {index}")]
    Status { status: u16, index: usize },

    #[error("Could not write or read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported TTS model: {0}")]
    Unsupported(String),
}

/// TTS interface trait
#[async_trait]
pub trait TTSInterface: Send + Sync {
    /// Synthesize `text` spoken in `lang_code` and return the MP3 bytes.
    async fn generate_audio(&self, text: &str, lang_code: &str) -> Result<Vec<u8>, TtsError>;
}

/// Write the audio to `path`, overwriting any previous file, then read it back.
pub async fn save_and_read_back(audio: &[u8], path: &Path) -> Result<Vec<u8>, TtsError> {
    tokio::fs::write(path, audio).await?;
    let bytes = tokio::fs::read(path).await?;
    debug!("Saved {} bytes of audio to {}", bytes.len(), path.display());
    Ok(bytes)
}
