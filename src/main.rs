//! User Lookup - user-record lookup service over swappable storage
//!
//! Binary entry point: wires configuration, storage, service and HTTP server.

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_lookup::{serve_and_close, AppState, Config};

/// Main entry point for the user lookup server.
///
/// # Startup Sequence
/// 1. Load configuration (`CONFIG_PATH`, default `config.json`) plus env overrides
/// 2. Initialize tracing subscriber for logging
/// 3. Build metrics, the configured backend and the lookup service
/// 4. Initialize the backend (abort startup on failure)
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Cancel in-flight work, drain, then close the backend (even if serving failed)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load config")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("user_lookup={},tower_http=info", config.app.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let features = config.app.features;
    info!(component = "APP", "Loaded configuration");
    info!(component = "APP", "Environment: {}", config.app.environment);
    info!(
        component = "APP",
        "Features: cache={}, rate_limiting={}, metrics={}",
        features.cache_enabled,
        features.rate_limiting,
        features.metrics_enabled
    );

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(config.clone()).with_shutdown(shutdown.clone());

    state
        .database()
        .initialize(&shutdown)
        .await
        .context("Failed to initialize database")?;

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(component = "SERVER", "Server listening on http://{}", addr);
    info!(component = "APP", "Try: curl http://{}/user?id=1", addr);

    serve_and_close(listener, state, shutdown_signal(shutdown))
        .await
        .context("Server error")?;
    info!(component = "SERVER", "Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, cancels `shutdown` so in-flight lookups stop waiting.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(component = "SERVER", "Failed to listen for Ctrl+C: {}", e);
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
                error!(component = "SERVER", "Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(component = "SERVER", "Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!(component = "SERVER", "Received SIGTERM, initiating shutdown...");
        }
    }

    shutdown.cancel();
}
