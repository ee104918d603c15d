//! CAIDA as-org2info parser
//!
//! # Format
//! ```text
//! # format:org_id|changed|org_name|country|source
//! ORG-EX1-RIPE|20240101|Example Org|FR|RIPE
//! # format:aut|changed|aut_name|org_id|opaque_id|source
//! 64500|20240101|EXAMPLE-AS|ORG-EX1-RIPE||RIPE
//! ```
//!
//! Only the organization section is read; the AS section after the second
//! format header is not ingested.

use std::path::Path;

use asnmap_common::types::{OrganizationInfo, Record};

use super::{expect_lines, ParseOutcome};
use crate::ingest::reader::{ReadError, SourceContent};
use crate::ingest::report::RecordIssue;

pub const ORG_INFO_HEADER: &str = "# format:org_id|changed|org_name|country|source";

const SECTION_PREFIX: &str = "# format:";
const FIELD_COUNT: usize = 5;

pub fn parse_org_info(
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<Record>, ReadError> {
    let lines = expect_lines(path, content)?;
    let mut outcome = ParseOutcome::default();
    let mut in_section = false;

    for (index, line) in lines.iter().enumerate() {
        let line_num = index + 1;

        if line.starts_with(SECTION_PREFIX) {
            if in_section {
                break;
            }
            in_section = line.starts_with(ORG_INFO_HEADER);
            continue;
        }
        if !in_section || line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.splitn(FIELD_COUNT, '|').map(str::trim).collect();
        if fields.len() < FIELD_COUNT || fields[0].is_empty() {
            outcome.malformed(RecordIssue::malformed(
                path,
                line_num,
                format!("expected {FIELD_COUNT} fields with an org_id, got {}", fields.len()),
            ));
            continue;
        }

        outcome.push(
            Some(line_num),
            Record::OrgInfo(OrganizationInfo {
                org_id: fields[0].to_string(),
                changed: fields[1].to_string(),
                org_name: fields[2].to_string(),
                country: fields[3].to_string(),
                source: fields[4].to_string(),
            }),
        );
    }

    Ok(outcome)
}
