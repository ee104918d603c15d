//! Shared utilities for feature modules
//!
//! - **validation**: parsing of path and body parameters into domain types
//! - **test_helpers**: router fixtures over an in-memory store (test-only)

pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use validation::{parse_entity_kind, parse_job_id};
