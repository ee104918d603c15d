//! asnmap common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared domain types, error handling and logging for the asnmap workspace.
//!
//! - **Types**: the five stored entity kinds, their natural keys and the
//!   relationship merge rule
//! - **List codec**: the JSON array format used to persist list-valued fields
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```
//! use asnmap_common::types::{normalize_asn, RelationshipEdge, RelationshipUpdate};
//!
//! let asn = normalize_asn("AS64500");
//! let edge = RelationshipUpdate::customer(&asn, "64501").apply_to(None);
//! assert_eq!(edge, RelationshipEdge::new("64500", "64501", ""));
//! ```

pub mod error;
pub mod list_codec;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{AsnMapError, Result};
