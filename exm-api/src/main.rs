//! exm-api - Excess Music catalog service
//!
//! Serves the catalog JSON API under `/api`, stored media under `/uploads`
//! and the static frontend for everything else.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use exm_api::cli::Cli;
use exm_api::{build_router, AppState};
use exm_common::config::{load_toml_layer, Config};
use exm_common::db::{init_database, init_in_memory};
use tokio::signal;
use tracing::{error, info, warn};

/// How often idle rate limiter keys are swept
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Excess Music API (exm-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Command line + environment, then TOML file, then defaults
    let cli = Cli::parse();
    let file_layer = match cli.config_path() {
        Some(path) => {
            let layer = load_toml_layer(&path)?;
            if layer.is_some() {
                info!("Loaded config file: {}", path.display());
            }
            layer.unwrap_or_default()
        }
        None => Default::default(),
    };
    let config = Config::resolve(cli.into_layer().or(file_layer));
    config.validate().context("Invalid configuration")?;
    info!("Environment: {}", config.environment);

    let pool = match config.database_path.as_deref() {
        Some(path) => match init_database(path).await {
            Ok(pool) => {
                info!("✓ Connected to database: {}", path.display());
                pool
            }
            Err(e) if config.environment.is_development() => {
                warn!(
                    "Failed to open database {} ({}); continuing with an in-memory store",
                    path.display(),
                    e
                );
                init_in_memory().await?
            }
            Err(e) => {
                error!("Failed to connect to database: {}", e);
                return Err(e.into());
            }
        },
        None => init_in_memory().await?,
    };

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config);

    state
        .uploads
        .ensure_dirs()
        .with_context(|| format!("Failed to create upload root {}", state.uploads.root().display()))?;
    if state.mailer.is_none() {
        info!("Email not configured; contact submissions are logged only");
    }

    let limits = state.limits.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limits.retain_recent();
        }
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("exm-api listening on http://{}", bind_address);
    info!("Health check: http://{}/api/health", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
