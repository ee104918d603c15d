//! asnmap Ingest - dataset ingestion and lookup tool

use asnmap_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use asnmap_ingest::{execute, Cli};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag; stdout is reserved for JSON
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Stderr)
        .log_file_prefix("asnmap-ingest")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = if std::env::var_os("LOG_LEVEL").is_some() {
        LogConfig::from_env().unwrap_or(log_config)
    } else {
        log_config
    };

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    match execute(&cli).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output.json) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                },
            }
            if output.failed {
                process::exit(1);
            }
        },
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        },
    }
}
