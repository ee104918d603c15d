//! Dataset ingestion
//!
//! # Architecture
//!
//! - **reader**: file → lines, CSV rows or JSON tree, chosen by extension
//! - **parsers**: one parser per dataset, emitting typed candidates and
//!   per-record issues
//! - **resolver**: two-pass customer/provider inference for relationship files
//! - **pipeline**: read → parse → reconcile for one file, producing an
//!   [`IngestionReport`]
//! - **jobs**: in-process registry of background ingestion jobs
//! - **orchestrator**: runs pipelines inline or as tracked background jobs
//!
//! # Datasets
//!
//! | Kind           | Format | Natural key |
//! |----------------|--------|-------------|
//! | `organization` | JSON   | ASN         |
//! | `delegation`   | text   | value       |
//! | `category`     | CSV    | ASN         |
//! | `relationship` | text   | ASN         |
//! | `org-info`     | text   | org_id      |

pub mod jobs;
pub mod orchestrator;
pub mod parsers;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod resolver;

pub use jobs::{IngestionJob, JobRegistry, JobStatus};
pub use orchestrator::{IngestOrchestrator, SubmitError};
pub use pipeline::{ingest, IngestOptions};
pub use reader::{read_source, ReadError, SourceContent};
pub use report::{IngestionReport, IssueKind, RecordIssue, ReportStatus};
