pub mod backend_client;
pub mod chain;
pub mod clipboard;
pub mod config;
pub mod config_manager;
pub mod error;
pub mod languages;
pub mod llm;
pub mod prompt;
pub mod routes;
pub mod session;
pub mod state;
pub mod tts;
pub mod ui;
pub mod utils;

#[cfg(test)]
mod test_support;

/// Default `tracing` filter used by both binaries when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "lcel_translate=debug,tower_http=debug";

/// Install the global `tracing` subscriber.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
