//! asnmap Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line access to the ingestion pipeline and profile lookups without
//! going through the HTTP server. Every command prints JSON on stdout.
//!
//! # Example
//!
//! ```no_run
//! use asnmap_ingest::{execute, Cli};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_from(["asnmap-ingest", "--store", "memory", "profile", "AS64500"]);
//!     let output = execute(&cli).await?;
//!     println!("{}", output.json);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use anyhow::Context;
use asnmap_common::types::EntityKind;
use asnmap_server::config::{Config, StoreBackend};
use asnmap_server::ingest::IngestOrchestrator;
use asnmap_server::profile::{ExpansionDepth, PageRequest, ProfileAssembler};
use asnmap_server::store;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "asnmap-ingest")]
#[command(author, version, about = "asnmap dataset ingestion and lookup tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Record store backend (overrides ASNMAP_STORE)
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreArg>,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    Sqlite,
    Memory,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Sqlite => StoreBackend::Sqlite,
            StoreArg::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest one dataset file and print its report
    Ingest {
        /// organization, delegation, category, relationship or org-info
        #[arg(short, long)]
        kind: EntityKind,

        /// Dataset file
        path: PathBuf,
    },

    /// Print the composite profile of an ASN
    Profile {
        asn: String,

        #[arg(long)]
        sibling_depth: Option<u8>,

        #[arg(long)]
        customer_depth: Option<u8>,

        #[arg(long)]
        provider_depth: Option<u8>,
    },

    /// List profiles of ASNs delegated to a country
    Country {
        /// Two-letter country code
        cc: String,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        per_page: Option<u32>,
    },

    /// List profiles of ASNs with a category label
    Category {
        label: String,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        per_page: Option<u32>,
    },
}

/// Result of one command
#[derive(Debug)]
pub struct CommandOutput {
    pub json: Value,
    /// The command ran but its work failed (an ingestion job failure)
    pub failed: bool,
}

impl CommandOutput {
    fn ok(json: Value) -> Self {
        Self {
            json,
            failed: false,
        }
    }
}

/// Load configuration, then apply command-line overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(store) = cli.store {
        config.store.backend = store.into();
    }
    if let Some(url) = &cli.database_url {
        config.store.url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Run the command against the store selected by configuration.
pub async fn execute(cli: &Cli) -> anyhow::Result<CommandOutput> {
    let config = resolve_config(cli)?;
    execute_with(cli, &config).await
}

pub async fn execute_with(cli: &Cli, config: &Config) -> anyhow::Result<CommandOutput> {
    let store = store::connect(&config.store)
        .await
        .context("Failed to open record store")?;
    info!(backend = store.backend(), "Record store ready");

    let assembler = ProfileAssembler::new(store.clone(), config.profile.expansion_depth());

    match &cli.command {
        Command::Ingest { kind, path } => {
            let orchestrator = IngestOrchestrator::new(store, &config.ingest);
            let report = orchestrator.run(*kind, path).await;
            Ok(CommandOutput {
                failed: report.is_failed(),
                json: serde_json::to_value(&report)?,
            })
        },
        Command::Profile {
            asn,
            sibling_depth,
            customer_depth,
            provider_depth,
        } => {
            let defaults = assembler.default_depth();
            let depth = ExpansionDepth {
                siblings: sibling_depth.unwrap_or(defaults.siblings),
                customers: customer_depth.unwrap_or(defaults.customers),
                providers: provider_depth.unwrap_or(defaults.providers),
            };
            let profile = assembler.lookup_profile_with_depth(asn, depth).await?;
            Ok(CommandOutput::ok(serde_json::to_value(&profile)?))
        },
        Command::Country { cc, page, per_page } => {
            let listing = assembler
                .lookup_by_country(cc, PageRequest::new(*page, *per_page))
                .await?;
            Ok(CommandOutput::ok(serde_json::to_value(&listing)?))
        },
        Command::Category {
            label,
            page,
            per_page,
        } => {
            let listing = assembler
                .lookup_by_category(label, PageRequest::new(*page, *per_page))
                .await?;
            Ok(CommandOutput::ok(serde_json::to_value(&listing)?))
        },
    }
}
