use analyzer::{GeminiClient, GeminiSettings};
use anyhow::Context;
use api::{router, AppState, Config, Dashboard};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!(model = %config.model, refresh_secs = config.refresh_interval.as_secs(), "=== CDR Analysis API ===");

    let client = GeminiClient::new(GeminiSettings {
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        base_url: config.base_url.clone(),
        timeout: config.request_timeout,
    })
    .context("Failed to build analysis client")?;

    let dashboard = Dashboard::new(Arc::new(client), config.refresh_interval);

    // CORS for web frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(AppState { dashboard }).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(bind = %config.bind, "API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
