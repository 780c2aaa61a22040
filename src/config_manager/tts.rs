use serde::{Deserialize, Serialize};

/// Configuration for text-to-speech playback in the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TTSConfig {
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Host serving the `translate_tts` endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub slow: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tts_model() -> String {
    "gtts".to_string()
}

fn default_base_url() -> String {
    "https://translate.google.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            tts_model: default_tts_model(),
            base_url: default_base_url(),
            slow: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}
