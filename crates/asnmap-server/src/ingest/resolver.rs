//! Relationship resolver
//!
//! A relationship file carries one direction per line. Each ASN's stored edge
//! accumulates a customer and a provider reference as the file is scanned:
//! every line is applied with [`RecordStore::merge_relationship`], which
//! re-reads the stored edge and only replaces the direction the line speaks
//! about. The final edge is therefore the same whichever of `A|B|0` and
//! `A|C|-1` comes first. A later line in the same direction replaces the
//! earlier reference.

use std::path::Path;

use asnmap_common::types::RelationshipUpdate;
use tracing::{debug, error};

use super::parsers::Candidate;
use super::report::{IngestionReport, RecordIssue};
use crate::store::RecordStore;

/// Relationship type code in the third field of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationCode {
    /// `0`: the first ASN has the second as customer
    Customer,
    /// `-1`: the first ASN has the second as provider
    Provider,
    Other,
}

impl RelationCode {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "0" => RelationCode::Customer,
            "-1" => RelationCode::Provider,
            _ => RelationCode::Other,
        }
    }

    pub fn update(self, asn: String, other: String) -> Option<RelationshipUpdate> {
        match self {
            RelationCode::Customer => Some(RelationshipUpdate::customer(asn, other)),
            RelationCode::Provider => Some(RelationshipUpdate::provider(asn, other)),
            RelationCode::Other => None,
        }
    }
}

/// Apply updates to the store in file order.
///
/// A store failure skips that line only.
pub async fn resolve(
    store: &dyn RecordStore,
    path: &Path,
    updates: Vec<Candidate<RelationshipUpdate>>,
    report: &mut IngestionReport,
    max_reported: usize,
) {
    for Candidate { line, item } in updates {
        match store.merge_relationship(&item).await {
            Ok(edge) => {
                debug!(asn = %edge.asn, customer = %edge.customer, provider = %edge.provider, "Edge merged");
                report.record_written(None);
            },
            Err(e) => {
                error!(path = %path.display(), line = ?line, asn = %item.asn(), "Failed to merge relationship: {}", e);
                report.record_issue(
                    RecordIssue::store_failure(path, line, item.asn(), e.to_string()),
                    max_reported,
                );
            },
        }
    }
}
