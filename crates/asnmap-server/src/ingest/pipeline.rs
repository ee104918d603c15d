//! Per-file ingestion pipeline: read → parse → reconcile
//!
//! One canonical pipeline serves every entity kind. File-level failures (the
//! file cannot be read or has the wrong overall shape) fail the report;
//! record-level problems are counted and kept as issues while the run goes on.

use std::path::Path;

use asnmap_common::types::{EntityKind, Record};
use tracing::{error, info, warn};

use super::parsers::{self, Candidate, ParseOutcome};
use super::reader::{read_source, ReadError, SourceContent};
use super::report::{IngestionReport, RecordIssue};
use super::resolver;
use crate::config::DEFAULT_MAX_REPORTED_ERRORS;
use crate::store::RecordStore;

/// Knobs for one ingestion run
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Cap on detailed issues kept in the report
    pub max_reported_errors: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }
}

/// Ingest one file of the given kind into `store`.
///
/// Never returns an error: failures are described by the report.
pub async fn ingest(
    store: &dyn RecordStore,
    kind: EntityKind,
    path: &Path,
    options: &IngestOptions,
) -> IngestionReport {
    info!(kind = %kind, path = %path.display(), "Starting ingestion");
    let mut report = IngestionReport::start(kind, path);

    let content = match read_source(path).await {
        Ok(content) => content,
        Err(e) => return fail(report, e),
    };

    let max = options.max_reported_errors;
    let result = match kind {
        EntityKind::Relationship => match parsers::parse_relationships(path, &content) {
            Ok(outcome) => {
                let updates = absorb(&mut report, outcome, max);
                resolver::resolve(store, path, updates, &mut report, max).await;
                Ok(())
            },
            Err(e) => Err(e),
        },
        _ => match parse_records(kind, path, &content) {
            Ok(outcome) => {
                let records = absorb(&mut report, outcome, max);
                reconcile(store, path, records, &mut report, max).await;
                Ok(())
            },
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        return fail(report, e);
    }

    let report = report.finish();
    info!(
        kind = %kind,
        path = %path.display(),
        processed = report.records_processed,
        inserted = report.records_inserted,
        updated = report.records_updated,
        skipped = report.records_skipped,
        "Ingestion completed"
    );
    report
}

fn parse_records(
    kind: EntityKind,
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<Record>, ReadError> {
    match kind {
        EntityKind::Organization => parsers::parse_organizations(path, content),
        EntityKind::Delegation => parsers::parse_delegations(path, content),
        EntityKind::Category => parsers::parse_categories(path, content),
        EntityKind::OrgInfo => parsers::parse_org_info(path, content),
        EntityKind::Relationship => Err(ReadError::format(
            path,
            "relationship files are resolved, not upserted",
        )),
    }
}

/// Move parse issues into the report and hand back the candidates.
fn absorb<T>(
    report: &mut IngestionReport,
    outcome: ParseOutcome<T>,
    max_reported: usize,
) -> Vec<Candidate<T>> {
    for issue in outcome.issues {
        report.record_issue(issue, max_reported);
    }
    for _ in 0..outcome.ignored {
        report.record_ignored();
    }
    outcome.candidates
}

/// Upsert candidates one by one; a failed write skips only that record.
async fn reconcile(
    store: &dyn RecordStore,
    path: &Path,
    records: Vec<Candidate<Record>>,
    report: &mut IngestionReport,
    max_reported: usize,
) {
    for Candidate { line, item } in records {
        let key = item.key().to_string();
        match store.upsert(item).await {
            Ok(outcome) => report.record_written(Some(outcome)),
            Err(e) => {
                error!(path = %path.display(), line = ?line, key = %key, "Failed to store record: {}", e);
                report.record_issue(
                    RecordIssue::store_failure(path, line, &key, e.to_string()),
                    max_reported,
                );
            },
        }
    }
}

fn fail(report: IngestionReport, err: ReadError) -> IngestionReport {
    warn!(path = %err.path().display(), "Ingestion failed: {}", err);
    report.fail(err.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ingest::report::ReportStatus;
    use crate::store::MemoryRecordStore;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_malformed_relationship_line_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "as-rel.txt", "64500|64501|0\n64502\n");
        let store = MemoryRecordStore::new();

        let report = ingest(&store, EntityKind::Relationship, &path, &IngestOptions::default()).await;

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.records_processed, 1);
        assert_eq!(report.records_skipped, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_fails_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "orgs.json", "{not json");
        let store = MemoryRecordStore::new();

        let report = ingest(&store, EntityKind::Organization, &path, &IngestOptions::default()).await;

        assert!(report.is_failed());
        assert!(report.failure.unwrap().contains("Invalid content"));
        assert_eq!(store.count(EntityKind::Organization).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_shape_for_kind_fails_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "categories.txt", "ASN,x\n");
        let store = MemoryRecordStore::new();

        let report = ingest(&store, EntityKind::Category, &path, &IngestOptions::default()).await;
        assert!(report.is_failed());
    }

    #[tokio::test]
    async fn test_second_run_updates_instead_of_inserting() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "categories.csv",
            "ASN,Category 1 - Layer 1,Category 1 - Layer 2\nAS1,isp,transit\nAS2,cdn,\n",
        );
        let store = MemoryRecordStore::new();
        let options = IngestOptions::default();

        let first = ingest(&store, EntityKind::Category, &path, &options).await;
        let second = ingest(&store, EntityKind::Category, &path, &options).await;

        assert_eq!(first.records_inserted, 2);
        assert_eq!(second.records_inserted, 0);
        assert_eq!(second.records_updated, 2);
        assert_eq!(store.count(EntityKind::Category).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_fails_job() {
        let store = MemoryRecordStore::new();
        let report = ingest(
            &store,
            EntityKind::Delegation,
            Path::new("/nonexistent/delegated.txt"),
            &IngestOptions::default(),
        )
        .await;
        assert!(report.is_failed());
        assert!(report.finished_at.is_some());
    }
}
