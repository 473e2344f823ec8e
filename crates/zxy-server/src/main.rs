// Entry point for the proxy server

use anyhow::{Context, Result};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zxy_server::{AppState, ServerConfig, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zxy_core=debug,zxy_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");
    if config.ai_api_key.is_none() {
        tracing::warn!("AI_API_KEY is not set, stream URL requests will fail");
    }

    let proxy = config.build_proxy().context("Failed to build proxy")?;
    for source in proxy.sources().iter() {
        tracing::info!(id = %source.id, name = %source.name, base_url = %source.base_url, "Configured source");
    }

    let app = router(AppState::new(proxy));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("ZXY Multi-Source Proxy Server listening at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
    }
}
