//! # lms-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080) and opens
//! the datastore selected by `LMS_STORE`.

use std::sync::Arc;

use lms_api::state::{AppConfig, AppState};
use lms_core::SystemClock;
use lms_store::StoreConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication is disabled");
    }

    let store_config = StoreConfig::from_env().map_err(|e| {
        tracing::error!("Datastore configuration invalid: {e}");
        e
    })?;
    if matches!(store_config, StoreConfig::Memory) {
        tracing::warn!("using the in-memory datastore; records will not survive restarts");
    }
    let store = lms_store::connect(store_config).await.map_err(|e| {
        tracing::error!("Datastore initialization failed: {e}");
        e
    })?;

    let port = config.port;
    let state = AppState::with_store(store, Arc::new(SystemClock), config);
    let app = lms_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("LMS API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
