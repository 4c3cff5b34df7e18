// src/daemon/mod.rs
pub mod collector;
pub mod handlers;
pub mod squeue;
pub mod state;
pub mod system;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use clusterdash_core::dashboard::synthetic;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::DaemonConfig;
use collector::{run_collector, Collector};
use handlers::{handle_health, handle_metrics};
use state::BackendState;

/// HTTP surface of the backend.
pub fn router(state: BackendState) -> Router {
    Router::new()
        .route("/api/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Starts the collector and serves metrics until Ctrl-C.
pub async fn start(config: &DaemonConfig) -> Result<()> {
    log::info!(
        "Daemon starting on {} (mock data: {})",
        config.listen_addr,
        config.mock
    );

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    log::info!("Successfully bound to {}", config.listen_addr);

    // Sample data only ever stands in for real readings in mock mode.
    let (backend_state, collector) = if config.mock {
        (BackendState::new(synthetic::baseline()), Collector::Mock)
    } else {
        // Host probing primes the CPU counters, which blocks briefly.
        let collector = tokio::task::spawn_blocking(Collector::host)
            .await
            .context("Failed to initialize host collector")?;
        (BackendState::empty(), collector)
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let collector_handle = tokio::spawn(run_collector(
        collector,
        backend_state.clone(),
        config.collect_interval(),
        shutdown_rx.clone(),
    ));
    log::info!("Collector task started.");

    let mut server_shutdown = shutdown_rx;
    let server = axum::serve(listener, router(backend_state)).with_graceful_shutdown(async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    });

    log::info!("Daemon ready and listening for connections.");
    let server_handle = tokio::spawn(async move { server.await });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    log::info!("Shutdown signal received, stopping.");
    if shutdown_tx.send(true).is_err() {
        log::error!("Failed to send shutdown signal: receivers dropped?");
    }

    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("HTTP server error: {}", e),
        Err(e) => log::error!("HTTP server task failed: {}", e),
    }
    if let Err(e) = collector_handle.await {
        log::error!("Collector task failed: {}", e);
    }

    log::info!("Daemon has shut down.");
    Ok(())
}
