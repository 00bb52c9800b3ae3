use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenv::dotenv;
use pod_api::{
    config::SecurityConfig,
    crypto::CryptoService,
    monitoring::{FileIntegrityCheck, MonitoringService, SecurityCheck},
    observability::Observability,
    routes,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let obs = Observability::init()?;
    let config = SecurityConfig::from_env().context("invalid security configuration")?;

    let crypto = match config.encryption_key.as_deref() {
        Some(key) => CryptoService::from_hex(key).context("ENCRYPTION_KEY must be 64 hex characters")?,
        None => {
            tracing::warn!("ENCRYPTION_KEY not set; using a random key for this process");
            CryptoService::random()
        }
    };

    let integrity = FileIntegrityCheck::new(config.monitoring.watch_paths.clone());
    tracing::info!(watched = integrity.watched(), "File integrity baseline recorded");
    let checks: Vec<Box<dyn SecurityCheck>> = vec![Box::new(integrity)];
    let mut monitoring = MonitoringService::spawn(config.monitoring.interval, checks);

    let port = config.port;
    let state = AppState::new(config, crypto, obs.registry)?;
    let app = routes::app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitoring.stop().await;
    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
