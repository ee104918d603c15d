//! Record parsers, one per source dataset
//!
//! Each parser takes the uniform [`SourceContent`] produced by the reader and
//! turns it into typed candidates. Parsing fails soft: a malformed record
//! becomes a [`RecordIssue`] and the scan continues. Only a file whose overall
//! shape is wrong (for example CSV rows where JSON was expected) fails the
//! whole parse with [`ReadError::Format`].

pub mod category;
pub mod delegation;
pub mod org_info;
pub mod organization;
pub mod relationship;

use std::path::Path;

use tracing::warn;

use super::reader::{ReadError, SourceContent};
use super::report::RecordIssue;

pub use category::parse_categories;
pub use delegation::{parse_delegations, DELEGATION_SENTINEL};
pub use org_info::{parse_org_info, ORG_INFO_HEADER};
pub use organization::parse_organizations;
pub use relationship::parse_relationships;

/// A parsed record with the position it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    /// 1-based file line; `None` for entries of a keyed JSON document
    pub line: Option<usize>,
    pub item: T,
}

/// Everything a parser found in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome<T> {
    pub candidates: Vec<Candidate<T>>,
    pub issues: Vec<RecordIssue>,
    /// Well-formed records intentionally not turned into candidates
    pub ignored: u64,
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            issues: Vec::new(),
            ignored: 0,
        }
    }
}

impl<T> ParseOutcome<T> {
    fn push(&mut self, line: Option<usize>, item: T) {
        self.candidates.push(Candidate { line, item });
    }

    fn malformed(&mut self, issue: RecordIssue) {
        warn!(
            path = %issue.path,
            line = ?issue.line,
            key = ?issue.key,
            "Skipping malformed record: {}",
            issue.message
        );
        self.issues.push(issue);
    }
}

fn expect_lines<'a>(path: &Path, content: &'a SourceContent) -> Result<&'a [String], ReadError> {
    match content {
        SourceContent::Lines(lines) => Ok(lines),
        other => Err(ReadError::format(
            path,
            format!("expected text lines, got {}", other.shape()),
        )),
    }
}
