//! Ingestion reports and record-level issues

use std::path::Path;

use asnmap_common::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::UpsertOutcome;

/// What went wrong with a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Wrong field count or a required field is missing
    MalformedRecord,
    /// The store rejected the write after retries
    StoreFailure,
}

/// Structured description of one skipped record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub kind: IssueKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl RecordIssue {
    pub fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::MalformedRecord,
            path: path.display().to_string(),
            line: Some(line),
            key: None,
            field: None,
            message: message.into(),
        }
    }

    /// Malformed entry of a keyed document, where there is no line to point at
    pub fn malformed_entry(path: &Path, key: &str, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::MalformedRecord,
            path: path.display().to_string(),
            line: None,
            key: Some(key.to_string()),
            field: None,
            message: message.into(),
        }
    }

    pub fn store_failure(
        path: &Path,
        line: Option<usize>,
        key: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: IssueKind::StoreFailure,
            path: path.display().to_string(),
            line,
            key: Some(key.to_string()),
            field: None,
            message: message.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Job outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Completed,
    Failed,
}

/// Summary of one ingestion run over one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub kind: EntityKind,
    pub path: String,
    pub status: ReportStatus,
    /// Records written to the store
    pub records_processed: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    /// Records not written: malformed, ignored or rejected by the store
    pub records_skipped: u64,
    /// Detailed issues, capped at the configured maximum
    pub errors: Vec<RecordIssue>,
    /// Issues counted but not kept in `errors`
    pub errors_omitted: u64,
    /// File-level failure that aborted the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionReport {
    pub fn start(kind: EntityKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.display().to_string(),
            status: ReportStatus::Completed,
            records_processed: 0,
            records_inserted: 0,
            records_updated: 0,
            records_skipped: 0,
            errors: Vec::new(),
            errors_omitted: 0,
            failure: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_written(&mut self, outcome: Option<UpsertOutcome>) {
        self.records_processed += 1;
        match outcome {
            Some(UpsertOutcome::Inserted) => self.records_inserted += 1,
            Some(UpsertOutcome::Updated) => self.records_updated += 1,
            None => {},
        }
    }

    /// Count a record skipped without an issue, e.g. an ignored relation code
    pub fn record_ignored(&mut self) {
        self.records_skipped += 1;
    }

    /// Count a skipped record and keep its issue while under `max_reported`
    pub fn record_issue(&mut self, issue: RecordIssue, max_reported: usize) {
        self.records_skipped += 1;
        if self.errors.len() < max_reported {
            self.errors.push(issue);
        } else {
            self.errors_omitted += 1;
        }
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = ReportStatus::Failed;
        self.failure = Some(message.into());
        self.finish()
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == ReportStatus::Failed
    }
}
