use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::backend_client::{ClientError, TranslationServiceClient};
use crate::chain::{TranslationChain, Translator};
use crate::clipboard::{ClipboardInterface, SystemClipboard};
use crate::config::{ClientConfig, ServerConfig};
use crate::llm::StatelessLLMFactory;
use crate::session::SessionStore;
use crate::tts::{TTSFactory, TTSInterface};

/// Shared state of the translation server.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<TranslationChain>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let llm = StatelessLLMFactory::create_llm(&config.llm_provider, &config.llm)?;
        Ok(Self::from_chain(TranslationChain::new(llm)?))
    }

    pub fn from_chain(chain: TranslationChain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }
}

pub type Backend = Arc<dyn Translator<Error = ClientError>>;

/// Shared state of the web UI.
#[derive(Clone)]
pub struct UiState {
    pub config: Arc<ClientConfig>,
    pub backend: Backend,
    pub sessions: SessionStore,
    pub tts: Arc<dyn TTSInterface>,
    pub clipboard: Arc<dyn ClipboardInterface>,
}

impl UiState {
    pub async fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let backend = TranslationServiceClient::new(
            config.backend_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        match backend.health_check().await {
            Ok(true) => info!("Translation server reachable at {}", backend.base_url()),
            Ok(false) => warn!("Translation server at {} is unhealthy", backend.base_url()),
            Err(e) => warn!("Translation server not reachable at {}: {}", backend.base_url(), e),
        }
        let tts = TTSFactory::create_tts(&config.tts)?;

        Ok(Self::with_parts(config, Arc::new(backend), tts, Arc::new(SystemClipboard)))
    }

    pub fn with_parts(
        config: ClientConfig,
        backend: Backend,
        tts: Arc<dyn TTSInterface>,
        clipboard: Arc<dyn ClipboardInterface>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            sessions: SessionStore::new(),
            tts,
            clipboard,
        }
    }
}
