use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lcel_translate::config::Config;
use lcel_translate::routes;
use lcel_translate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    lcel_translate::init_tracing();

    let config = Config::discover()?;
    let server_config = &config.server_config;

    let app_state = AppState::new(server_config)?;
    info!(
        "Serving chain backed by {} ({})",
        app_state.chain.model_name(),
        server_config.llm_provider
    );

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind {}", addr))?;
    info!("LangChain Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
