//! CAIDA AS-relationship parser
//!
//! # Format
//! ```text
//! # step 1: set peering in clique
//! # step 2: initial provider assignment
//! 64500|64501|0
//! 64500|64502|-1|bgp
//! ```
//!
//! Lines are `asn_a|asn_b|code[|...]`. Only codes `0` and `-1` produce
//! updates; see [`RelationCode`].

use std::path::Path;

use asnmap_common::types::{is_numeric_asn, normalize_asn, RelationshipUpdate};

use super::{expect_lines, ParseOutcome};
use crate::ingest::reader::{ReadError, SourceContent};
use crate::ingest::report::RecordIssue;
use crate::ingest::resolver::RelationCode;

pub fn parse_relationships(
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<RelationshipUpdate>, ReadError> {
    let lines = expect_lines(path, content)?;
    let mut outcome = ParseOutcome::default();

    for (index, line) in lines.iter().enumerate() {
        let line_num = index + 1;

        // Comments, including the two step markers
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < 3 {
            outcome.malformed(RecordIssue::malformed(
                path,
                line_num,
                format!("expected at least 3 fields, got {}", fields.len()),
            ));
            continue;
        }

        let asn = normalize_asn(fields[0]);
        let other = normalize_asn(fields[1]);
        if asn.is_empty() || other.is_empty() {
            outcome.malformed(RecordIssue::malformed(path, line_num, "empty ASN field"));
            continue;
        }
        if let Some(bad) = [&asn, &other].into_iter().find(|a| !is_numeric_asn(a)) {
            outcome.malformed(
                RecordIssue::malformed(path, line_num, format!("'{bad}' is not a numeric ASN"))
                    .with_key(bad.as_str()),
            );
            continue;
        }

        match RelationCode::parse(fields[2]).update(asn, other) {
            Some(update) => outcome.push(Some(line_num), update),
            None => outcome.ignored += 1,
        }
    }

    Ok(outcome)
}
