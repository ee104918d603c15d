//! asnmap Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ingests five public ASN datasets into one record store and serves merged
//! per-ASN profiles over HTTP.
//!
//! # Overview
//!
//! - **Ingestion**: reader, per-kind parsers and reconciliation into the
//!   store, run synchronously or as background jobs
//! - **Store**: the [`store::RecordStore`] seam with SQLite and in-memory
//!   backends
//! - **Profiles**: composite profile assembly with bounded, cycle-safe
//!   expansion of siblings, customers and providers
//! - **API**: vertical feature slices mounted under `/api/v1`
//!
//! # Architecture
//!
//! Reads and writes are split the way the feature folders show:
//!
//! - **Queries** read through the [`profile::ProfileAssembler`] or the store
//! - **Commands** queue ingestion jobs on the [`ingest::IngestOrchestrator`]
//!
//! # Example
//!
//! ```no_run
//! use asnmap_server::{api, config::Config, features::FeatureState, store};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = store::connect(&config.store).await?;
//!     api::serve(FeatureState::new(store, &config), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod profile;
pub mod store;

// Re-export commonly used types
pub use error::AppError;
