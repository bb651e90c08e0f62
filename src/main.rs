//! ParkPulse Monitor — terminal companion for the parking dashboard feed.
//!
//! Connects to the dashboard WebSocket, logs every forwarded message, and
//! keeps the connection alive until Ctrl+C or SIGTERM.

use std::time::Duration;

use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use parkpulse_core::config::AppConfig;
use parkpulse_core::error::AppError;
use parkpulse_core::types::id::LotId;
use parkpulse_realtime::{EndpointKind, RealtimeClient};

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
        tracing::error!("Monitor error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("PARKPULSE_ENV").unwrap_or_else(|_| "development".to_string());
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

/// Pick the feed to watch: a single lot when `PARKPULSE_LOT` is set,
/// otherwise the general dashboard feed.
fn resolve_endpoint() -> Result<EndpointKind, AppError> {
    match std::env::var("PARKPULSE_LOT") {
        Ok(raw) => {
            let lot: LotId = raw
                .parse()
                .map_err(|e| AppError::configuration(format!("Invalid PARKPULSE_LOT '{raw}': {e}")))?;
            Ok(EndpointKind::Lot(lot))
        }
        Err(_) => Ok(EndpointKind::General),
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ParkPulse Monitor v{}", env!("CARGO_PKG_VERSION"));

    let endpoint = resolve_endpoint()?;
    let client = RealtimeClient::connect(&config.realtime, &config.server.ws_base_url, endpoint);
    tracing::info!(url = %client.url(), "Watching dashboard feed");

    let _subscription = client.subscribe(|message| {
        tracing::info!(
            kind = message.kind.as_str(),
            payload = %message.payload,
            "Dashboard update"
        );
    });

    let mut report = tokio::time::interval(Duration::from_secs(30));
    report.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_signal() => break,
            _ = report.tick() => {
                let snapshot = client.snapshot();
                tracing::info!(
                    status = %snapshot.status,
                    subscribers = snapshot.subscribers,
                    "Connection report"
                );
                if let Some(error) = &snapshot.last_error {
                    tracing::debug!(error = %error, "Last connection error");
                }
            }
        }
    }

    tracing::info!("Shutdown signal received, closing connection...");
    client.dispose();
    tracing::info!("ParkPulse Monitor shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
