//! Ingestion job submission and status over HTTP

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{StartIngestionCommand, StartIngestionError};
pub use routes::ingestions_routes;
