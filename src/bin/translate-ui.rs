use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use lcel_translate::config::Config;
use lcel_translate::state::UiState;
use lcel_translate::ui;

#[tokio::main]
async fn main() -> Result<()> {
    lcel_translate::init_tracing();

    let config = Config::discover()?;
    let client_config = config.client_config;
    let addr = format!("{}:{}", client_config.host, client_config.port);
    let session_ttl = Duration::from_secs(client_config.session_ttl_secs);

    let ui_state = UiState::new(client_config).await?;
    let _reaper = ui::spawn_session_reaper(ui_state.sessions.clone(), session_ttl);

    let app = Router::new()
        .merge(ui::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(ui_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind {}", addr))?;
    info!("Translation UI listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
