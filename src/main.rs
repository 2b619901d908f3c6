//! avgstore server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - AVGSTORE_HOST: Bind address (default: 0.0.0.0)
//! - AVGSTORE_PORT: Port number (default: 8080)
//! - AVGSTORE_QUEUE_SIZE: Pending-submission buffer capacity (default: 128)
//! - RUST_LOG: Log level (default: info)

use avgstore::api::{run_server, ServerConfig};
use avgstore::storage::StoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "avgstore=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("AVGSTORE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("AVGSTORE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let store = StoreConfig::from_env()?;

    let config = ServerConfig { host, port, store };

    tracing::info!("avgstore configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Queue size: {}", config.store.queue_size);

    run_server(config).await
}
