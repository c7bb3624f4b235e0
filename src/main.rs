use anyhow::Result;
use std::sync::Arc;

use strava_stats_gateway::{
    auth::TokenManager,
    cache::TimedCache,
    config::Config,
    http_client::{build_http_client, StravaClient},
    routes::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Strava stats gateway starting...");
    tracing::info!(
        "Server configured: {}:{}",
        config.server_host,
        config.server_port
    );
    tracing::debug!("Credentials: {:?}", config.credentials);

    let http_client = build_http_client(config.http_connect_timeout, config.http_request_timeout)?;

    let token_manager = Arc::new(TokenManager::new(
        config.credentials.clone(),
        config.token_url.clone(),
        http_client.clone(),
    ));

    // Probe the credentials once; a failure is logged, not fatal
    match token_manager.get_valid_token().await {
        Ok(token) => {
            tracing::info!(
                "Strava authentication successful (token: {}...)",
                &token[..8.min(token.len())]
            );
        }
        Err(e) => {
            tracing::error!("Strava authentication failed: {}", e);
            tracing::warn!("Server will start but Strava endpoints will fail until credentials work");
        }
    }

    let strava = Arc::new(StravaClient::new(
        http_client,
        token_manager,
        config.api_base_url.clone(),
    ));

    let app_state = AppState {
        strava,
        cache: TimedCache::new(),
        cache_ttl_minutes: config.cache_ttl_minutes,
    };
    tracing::info!(
        "Response cache initialized (TTL: {} minutes)",
        config.cache_ttl_minutes
    );

    let app = routes::build_app(app_state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Handle graceful shutdown signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
