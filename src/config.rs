use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config_manager::utils::read_config_text;
use crate::config_manager::{LlmConfig, TTSConfig};

pub const DEFAULT_CONFIG_PATH: &str = "conf.yaml";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_config: ServerConfig,
    #[serde(default)]
    pub client_config: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_client_port")]
    pub port: u16,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Where the synthesized speech is written before being played back.
    #[serde(default = "default_audio_path")]
    pub audio_path: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub tts: TTSConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_client_port() -> u16 {
    8501
}

fn default_llm_provider() -> String {
    "groq_llm".to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_audio_path() -> String {
    "translation.mp3".to_string()
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            llm_provider: default_llm_provider(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_client_port(),
            backend_url: default_backend_url(),
            audio_path: default_audio_path(),
            session_ttl_secs: default_session_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            tts: TTSConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration file, choosing JSON or YAML by extension.
    pub fn load(path: &str) -> Result<Self> {
        let content = read_config_text(path)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON configuration in {}", path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML configuration in {}", path))?
        };
        Ok(config)
    }

    /// Load from `CONFIG_PATH` or the usual file names, falling back to defaults,
    /// then apply environment overrides.
    pub fn discover() -> Result<Self> {
        let explicit = std::env::var("CONFIG_PATH").ok();

        let mut config = match explicit {
            // An explicitly requested file must load.
            Some(path) => {
                let cfg = Self::load(&path)?;
                info!("Loaded configuration from: {}", path);
                cfg
            }
            None => Self::load_first_existing(&[DEFAULT_CONFIG_PATH, "conf.yml", "conf.json"])?,
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_first_existing(candidates: &[&str]) -> Result<Self> {
        for path in candidates {
            if !std::path::Path::new(path).exists() {
                debug!("No configuration at {}", path);
                continue;
            }
            let cfg = Self::load(path)?;
            info!("Loaded configuration from: {}", path);
            return Ok(cfg);
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// `GROQ_API_KEY` and `BACKEND_URL` win over file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GROQ_API_KEY").filter(|k| !k.is_empty()) {
            self.server_config.llm.llm_api_key = key;
        }
        if let Some(url) = lookup("BACKEND_URL").filter(|u| !u.is_empty()) {
            self.client_config.backend_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_temp(ext: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("lcel-conf-{}.{}", uuid::Uuid::new_v4(), ext));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_match_original_deployment() {
        let config = Config::default();
        assert_eq!(config.server_config.port, 8000);
        assert_eq!(config.server_config.llm_provider, "groq_llm");
        assert_eq!(config.server_config.llm.model, "Gemma2-9b-It");
        assert_eq!(config.client_config.backend_url, "http://localhost:8000");
        assert_eq!(config.client_config.audio_path, "translation.mp3");
    }

    #[test]
    fn loads_partial_yaml() {
        let path = write_temp(
            "yaml",
            "server_config:\n  port: 9100\n  llm:\n    model: llama-3.1-8b-instant\n",
        );
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server_config.port, 9100);
        assert_eq!(config.server_config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.server_config.host, "127.0.0.1");
        assert_eq!(config.client_config.port, 8501);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn loads_json_by_extension() {
        let path = write_temp("json", r#"{"client_config": {"backend_url": "http://api:9000"}}"#);
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.client_config.backend_url, "http://api:9000");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> =
            [("GROQ_API_KEY", "gsk_live"), ("BACKEND_URL", "http://remote:8000")].into();

        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server_config.llm.llm_api_key, "gsk_live");
        assert_eq!(config.client_config.backend_url, "http://remote:8000");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some(String::new()));
        assert_eq!(config.client_config.backend_url, DEFAULT_BACKEND_URL);
        assert!(config.server_config.llm.llm_api_key.is_empty());
    }
}
