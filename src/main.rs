//! FizzBuzz - an HTTP FizzBuzz service backed by a concurrent response cache

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fizz_buzz::{create_router, spawn_cleanup_task, spawn_refresh_worker, AppState, Config};

/// Main entry point for the FizzBuzz service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the response cache with configured parameters
/// 4. Start the refresh worker and the expiry sweep
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM stop the background tasks and drain in-flight computations
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fizz_buzz=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        "Starting FizzBuzz service"
    );

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_enabled={}, entry_max_size={}, entry_ttl={}s, negative_ttl={}s, cleanup_interval={}s",
        config.server_port,
        config.cache_enabled,
        config.entry_max_size,
        config.entry_ttl,
        config.negative_ttl,
        config.cleanup_interval
    );

    let state = AppState::from_config(&config);
    let cache = state.cache.clone();

    let mut background = Vec::new();
    if let Some(cache) = &cache {
        background.push(spawn_refresh_worker(cache.clone(), state.compute.clone()));
        background.push(spawn_cleanup_task(cache.clone(), config.cleanup_interval));
        info!("Response cache initialized, background tasks started");
    } else {
        warn!("Response cache disabled");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    for handle in background {
        handle.abort();
    }

    if let Some(cache) = cache {
        let timeout = Duration::from_secs(config.shutdown_timeout);
        if cache.drain(timeout).await {
            info!("In-flight computations drained");
        } else {
            warn!(
                "Shutdown timeout of {}s reached with computations still in flight",
                config.shutdown_timeout
            );
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
