//! Source file readers
//!
//! Turns a dataset file into one of three uniform shapes, chosen by extension:
//!
//! - `.json` → the parsed JSON tree
//! - `.csv` → header-keyed rows
//! - anything else → trimmed text lines
//!
//! No schema checks happen here; parsers decide what a valid record is. Only
//! an unreadable file, invalid JSON or a bad CSV header fails the whole file.
//! A CSV row that cannot be decoded is kept as a [`Row`] carrying its error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// File-level read failures. Either one aborts the ingestion job.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid content in {}: {message}", path.display())]
    Format { path: PathBuf, message: String },
}

impl ReadError {
    pub fn format(path: &Path, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ReadError::Io { path, .. } | ReadError::Format { path, .. } => path,
        }
    }
}

/// One CSV data row with its 1-based line number in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: HashMap<String, String>,
    /// Set when the row could not be decoded; `fields` is then empty
    pub error: Option<String>,
}

impl Row {
    pub fn new(line: usize, fields: HashMap<String, String>) -> Self {
        Self {
            line,
            fields,
            error: None,
        }
    }

    pub fn undecodable(line: usize, error: impl Into<String>) -> Self {
        Self {
            line,
            fields: HashMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Uniform in-memory representation of a source file
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    /// Trimmed lines; index `i` is file line `i + 1`
    Lines(Vec<String>),
    Rows(Vec<Row>),
    Json(serde_json::Value),
}

impl SourceContent {
    pub fn shape(&self) -> &'static str {
        match self {
            SourceContent::Lines(_) => "text lines",
            SourceContent::Rows(_) => "CSV rows",
            SourceContent::Json(_) => "JSON document",
        }
    }
}

enum Format {
    Json,
    Csv,
    Text,
}

fn format_for(path: &Path) -> Format {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => Format::Json,
        Some("csv") => Format::Csv,
        _ => Format::Text,
    }
}

/// Read `path` into the shape selected by its extension.
pub async fn read_source(path: &Path) -> Result<SourceContent, ReadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let content = match format_for(path) {
        Format::Json => SourceContent::Json(
            serde_json::from_slice(&bytes).map_err(|e| ReadError::format(path, e.to_string()))?,
        ),
        Format::Csv => SourceContent::Rows(parse_csv(path, &bytes)?),
        Format::Text => {
            let text = String::from_utf8_lossy(&bytes);
            SourceContent::Lines(text.lines().map(|l| l.trim().to_string()).collect())
        },
    };

    debug!(path = %path.display(), shape = content.shape(), "Source file read");
    Ok(content)
}

fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Vec<Row>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ReadError::format(path, e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for (index, result) in reader.byte_records().enumerate() {
        let fallback_line = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                warn!(path = %path.display(), line, "Unreadable CSV row: {}", e);
                rows.push(Row::undecodable(line, e.to_string()));
                continue;
            },
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        match decode_fields(&headers, &record) {
            Ok(fields) => rows.push(Row::new(line, fields)),
            Err(message) => {
                warn!(path = %path.display(), line, "Undecodable CSV row: {}", message);
                rows.push(Row::undecodable(line, message));
            },
        }
    }

    Ok(rows)
}

/// Pair each field with its header, requiring UTF-8.
fn decode_fields(
    headers: &csv::StringRecord,
    record: &csv::ByteRecord,
) -> Result<HashMap<String, String>, String> {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, value)| {
            std::str::from_utf8(value)
                .map(|v| (header.to_string(), v.to_string()))
                .map_err(|e| format!("invalid UTF-8 in column '{header}': {e}"))
        })
        .collect()
}
