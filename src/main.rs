//! Manualink API server
//!
//! Usage: `manualink [config.yaml]`. Without a config file the built-in
//! defaults are used; `MANUALINK_CONFIG` is consulted when no argument is
//! given.

use anyhow::Result;
use manualink::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manualink=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MANUALINK_CONFIG").ok());

    let config = match config_path {
        Some(path) => {
            tracing::info!(path = %path, "loading configuration");
            ListingsConfig::from_yaml_file(&path)?
        }
        None => {
            tracing::info!("no configuration file given, using defaults");
            ListingsConfig::default_config()
        }
    };

    tracing::info!(
        listings = config.listings.len(),
        categories = config.categories.len(),
        "starting manualink"
    );

    ServerBuilder::new(config).with_event_bus(1024).serve().await
}
