use async_trait::async_trait;
use cli_clipboard::{ClipboardContext, ClipboardProvider};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait ClipboardInterface: Send + Sync {
    async fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The clipboard of the machine running the UI process.
pub struct SystemClipboard;

#[async_trait]
impl ClipboardInterface for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        let len = text.len();
        tokio::task::spawn_blocking(move || {
            ClipboardContext::new()
                .and_then(|mut ctx| ctx.set_contents(text))
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        })
        .await??;
        debug!("Copied {} bytes to the clipboard", len);
        Ok(())
    }
}
