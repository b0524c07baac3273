//! blockcache - HTTP server over a cached in-memory block store
//!
//! Serves the block API from a memory backend wrapped in the configured
//! cache layers.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blockcache::api::{create_router, AppState};
use blockcache::{BlockstoreError, Config};

/// Main entry point for the block cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache layers over the backing store
/// 4. Wait (bounded) for the bloom filter warm-up
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting block cache server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: arc_cache_size={}, bloom_filter_size={}, bloom_filter_hashes={}, port={}",
        config.cache.arc_cache_size,
        config.cache.bloom_filter_size,
        config.cache.bloom_filter_hashes,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to build cache layers")?;
    info!("Cache layers initialized");

    // A filter that is still warming up only costs extra backend reads
    if let Some(bloom) = state.store.bloom() {
        match bloom.wait(config.warmup_timeout).await {
            Ok(()) => info!("Bloom filter ready"),
            Err(BlockstoreError::DeadlineExceeded { added }) => warn!(
                "Bloom filter still warming up after {:?} ({} keys added), serving anyway",
                config.warmup_timeout, added
            ),
            Err(e) => return Err(e).context("bloom filter warm-up failed"),
        }
    }

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
