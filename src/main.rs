//! Gatekeeper Server: per-principal admission control in front of the API.
//!
//! Main entry point that wires all crates together and starts the server.

use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use gatekeeper_api::AppState;
use gatekeeper_core::config::AppConfig;
use gatekeeper_core::error::AppError;
use gatekeeper_limiter::IdleSweeper;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load and validate configuration. Invalid limits abort startup.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("GATEKEEPER_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Gatekeeper v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Admission control ────────────────────────────────
    let rate_limit = &config.rate_limit;
    tracing::info!(
        protected_prefix = %rate_limit.protected_prefix,
        window_minutes = rate_limit.window_minutes,
        anonymous_capacity = rate_limit.anonymous.capacity,
        standard_capacity = rate_limit.standard.capacity,
        privileged_capacity = rate_limit.privileged.capacity,
        "Initializing admission control"
    );

    let addr = config.server.bind_address();
    let shutdown_grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let eviction = config.rate_limit.eviction.clone();
    let state = AppState::from_config(config)?;

    // ── Step 2: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 3: Optional idle bucket eviction ────────────────────
    let sweeper_handle = if eviction.enabled {
        let sweeper = IdleSweeper::new(state.bucket_store(), &eviction);
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move { sweeper.run(cancel).await }))
    } else {
        tracing::info!("Idle bucket eviction disabled, buckets live for the process lifetime");
        None
    };

    // ── Step 4: Build and start HTTP server ──────────────────────
    let app = gatekeeper_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Gatekeeper listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(handle) = sweeper_handle {
        match tokio::time::timeout(shutdown_grace, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Idle bucket sweeper terminated abnormally: {}", e),
            Err(_) => tracing::warn!(
                grace_seconds = shutdown_grace.as_secs(),
                "Idle bucket sweeper did not stop within the shutdown grace period"
            ),
        }
    }

    tracing::info!("Gatekeeper shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
