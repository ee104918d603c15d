//! Regional registry delegation parser
//!
//! # Format
//! ```text
//! 2.3|ripencc|20240101|...            <- header and summary lines, skipped
//! iana|ZZ|asn|0|1|20140311|reserved|ietf|iana
//! ripencc|FR|asn|1|2|20200101|allocated|x|y
//! ```
//!
//! Everything up to and including the IANA reserved line is preamble.

use std::path::Path;

use asnmap_common::types::{DelegationRecord, Record};

use super::{expect_lines, ParseOutcome};
use crate::ingest::reader::{ReadError, SourceContent};
use crate::ingest::report::RecordIssue;

/// Last preamble line of a delegation file
pub const DELEGATION_SENTINEL: &str = "iana|ZZ|asn|0|1|20140311|reserved|ietf|iana";

const FIELD_COUNT: usize = 9;

pub fn parse_delegations(
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<Record>, ReadError> {
    let lines = expect_lines(path, content)?;
    let mut outcome = ParseOutcome::default();
    let mut past_sentinel = false;

    for (index, line) in lines.iter().enumerate() {
        let line_num = index + 1;

        if !past_sentinel {
            past_sentinel = line.starts_with(DELEGATION_SENTINEL);
            continue;
        }
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(record) => outcome.push(Some(line_num), Record::Delegation(record)),
            None => outcome.malformed(RecordIssue::malformed(
                path,
                line_num,
                format!(
                    "expected {FIELD_COUNT} fields, got {}",
                    line.split('|').count()
                ),
            )),
        }
    }

    if !past_sentinel {
        tracing::warn!(path = %path.display(), "Delegation sentinel line not found, no records parsed");
    }

    Ok(outcome)
}

/// Split one data line into its positional fields. Extra separators stay in
/// `extensions`.
fn parse_line(line: &str) -> Option<DelegationRecord> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, '|').map(str::trim).collect();
    if fields.len() < FIELD_COUNT {
        return None;
    }

    Some(DelegationRecord {
        registry: fields[0].to_string(),
        cc: fields[1].to_string(),
        allocation_type: fields[2].to_string(),
        start: fields[3].to_string(),
        value: fields[4].to_string(),
        date: fields[5].to_string(),
        status: fields[6].to_string(),
        opaque_id: fields[7].to_string(),
        extensions: fields[8].to_string(),
    })
}
