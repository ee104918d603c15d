//! asnmap Server - Main entry point

use anyhow::Result;
use asnmap_common::logging::{init_logging, LogConfig};
use tracing::info;

use asnmap_server::{api, config::Config, features::FeatureState, store};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("asnmap-server")
        .filter_directives("asnmap_server=debug,tower_http=debug,sqlx=warn")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    let _log_guard = init_logging(&log_config)?;

    info!("Starting asnmap server");

    let config = Config::load()?;
    info!(
        backend = %config.store.backend,
        data_dir = %config.ingest.data_dir.display(),
        "Configuration loaded - server will bind to {}:{}",
        config.server.host,
        config.server.port
    );

    let store = store::connect(&config.store).await?;
    info!(backend = store.backend(), "Record store ready");

    let state = FeatureState::new(store, &config);
    api::serve(state, &config).await
}
