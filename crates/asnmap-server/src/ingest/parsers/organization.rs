//! ASN to organization mapping parser
//!
//! # Format
//! ```json
//! {
//!   "64500": {
//!     "Status": "ok",
//!     "Name": "Example Net",
//!     "Reference Orgs": ["ORG-EX1"],
//!     "Sibling ASNs": ["64501", "64502"],
//!     "PDB.org_id": 42
//!   }
//! }
//! ```
//!
//! Missing fields default to empty. Scalars that are not strings keep their
//! JSON text.

use std::path::Path;

use asnmap_common::types::{is_numeric_asn, normalize_asn, OrganizationMapping, Record};
use serde_json::{Map, Value};

use super::ParseOutcome;
use crate::ingest::reader::{ReadError, SourceContent};
use crate::ingest::report::RecordIssue;

pub fn parse_organizations(
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<Record>, ReadError> {
    let document = match content {
        SourceContent::Json(Value::Object(map)) => map,
        SourceContent::Json(_) => {
            return Err(ReadError::format(path, "top-level JSON value must be an object"))
        },
        other => {
            return Err(ReadError::format(
                path,
                format!("expected JSON document, got {}", other.shape()),
            ))
        },
    };

    let mut outcome = ParseOutcome::default();
    for (raw_asn, value) in document {
        let asn = normalize_asn(raw_asn);
        if asn.is_empty() {
            outcome.malformed(RecordIssue::malformed_entry(path, raw_asn, "empty ASN key"));
            continue;
        }
        if !is_numeric_asn(&asn) {
            outcome.malformed(RecordIssue::malformed_entry(
                path,
                raw_asn,
                "ASN key is not numeric",
            ));
            continue;
        }

        let Value::Object(fields) = value else {
            outcome.malformed(RecordIssue::malformed_entry(
                path,
                &asn,
                "entry is not an object",
            ));
            continue;
        };

        match build_mapping(asn.clone(), fields) {
            Ok(mapping) => outcome.push(None, Record::Organization(mapping)),
            Err((field, message)) => outcome.malformed(
                RecordIssue::malformed_entry(path, &asn, message).with_field(field),
            ),
        }
    }

    Ok(outcome)
}

const SIBLINGS_FIELD: &str = "Sibling ASNs";

/// Err carries the offending field and a message.
fn build_mapping(
    asn: String,
    fields: &Map<String, Value>,
) -> Result<OrganizationMapping, (String, String)> {
    let sibling_asns: Vec<String> = list(fields, SIBLINGS_FIELD)?
        .iter()
        .map(|s| normalize_asn(s))
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(bad) = sibling_asns.iter().find(|s| !is_numeric_asn(s)) {
        return Err((
            SIBLINGS_FIELD.to_string(),
            format!("'{bad}' is not a numeric ASN"),
        ));
    }

    Ok(OrganizationMapping {
        asn,
        status: text(fields, "Status"),
        reference_orgs: list(fields, "Reference Orgs")?,
        sibling_asns,
        name: text(fields, "Name"),
        descr: text(fields, "Descr"),
        website: text(fields, "Website"),
        comparison_ca2o: text(fields, "Comparison with CA2O"),
        comparison_pdb: text(fields, "Comparison with PDB"),
        pdb_org_id: text(fields, "PDB.org_id"),
        pdb_org: text(fields, "PDB.org"),
    })
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text(fields: &Map<String, Value>, name: &str) -> String {
    fields.get(name).map(scalar).unwrap_or_default()
}

/// A single string is accepted as a one-element list.
fn list(fields: &Map<String, Value>, name: &str) -> Result<Vec<String>, (String, String)> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().map(scalar).collect()),
        Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(_) => Err((name.to_string(), "expected a list".to_string())),
    }
}
