use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config_manager::LlmConfig;
use crate::llm::openai_compatible_llm::OpenAICompatibleLLM;
use crate::llm::StatelessLLMInterface;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create an LLM based on the configuration.
    ///
    /// # Arguments
    /// * `llm_provider` - `groq_llm`, `openai_llm` or `openai_compatible_llm`
    /// * `config` - model, endpoint and credential settings
    pub fn create_llm(llm_provider: &str, config: &LlmConfig) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM: {}", llm_provider);

        let (base_url, key_var) = match llm_provider {
            "groq_llm" => (
                config.base_url.clone().unwrap_or_else(|| GROQ_BASE_URL.to_string()),
                "GROQ_API_KEY",
            ),
            "openai_llm" => (
                config.base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                "llm_api_key",
            ),
            "openai_compatible_llm" => {
                let base_url = config.base_url.clone().ok_or_else(|| {
                    anyhow::anyhow!("openai_compatible_llm requires server_config.llm.base_url")
                })?;
                (base_url, "llm_api_key")
            }
            _ => anyhow::bail!("Unsupported LLM provider: {}", llm_provider),
        };

        if config.llm_api_key.trim().is_empty() {
            anyhow::bail!("No API key configured for {} (set {})", llm_provider, key_var);
        }

        let llm = OpenAICompatibleLLM::new(
            config.model.clone(),
            base_url,
            config.llm_api_key.trim(),
            config.temperature,
            config.max_tokens,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Arc::new(llm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> LlmConfig {
        LlmConfig {
            llm_api_key: "gsk_test".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn builds_groq_by_default() {
        let llm = StatelessLLMFactory::create_llm("groq_llm", &keyed()).unwrap();
        assert_eq!(llm.model_name(), "Gemma2-9b-It");
    }

    #[test]
    fn missing_key_fails_at_startup() {
        let err = StatelessLLMFactory::create_llm("groq_llm", &LlmConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn compatible_provider_needs_base_url() {
        assert!(StatelessLLMFactory::create_llm("openai_compatible_llm", &keyed()).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = StatelessLLMFactory::create_llm("claude_llm", &keyed()).err().unwrap();
        assert!(err.to_string().contains("Unsupported LLM provider"));
    }
}
