use std::time::Duration;

use server::config;
use server::state::AppState;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Time the engine gets to exit after `quit` before it is killed
const ENGINE_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        stockfish = %config.stockfish_path,
        depth = config.default_depth,
        max_depth = config.max_depth,
        analysis_secs = config.analysis_time.as_secs(),
        lichess = %config.lichess_base_url,
        "Loaded configuration"
    );

    match &config.lichess_token {
        Some(token) => {
            let prefix: String = token.chars().take(8).collect();
            tracing::info!("Lichess token configured ({prefix}...)");
        }
        None => tracing::warn!("LICHESS_TOKEN not set - fetch_user_games will be unavailable"),
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config).context("Failed to build Lichess client")?;
    let engine = state.engine.clone();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Starting MCP server on {addr}");

    axum::serve(listener, server::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down engine");
    engine.shutdown(ENGINE_SHUTDOWN_GRACE).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
