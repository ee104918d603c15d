//! AS category label parser (CSV)

use std::path::Path;

use asnmap_common::types::{is_numeric_asn, normalize_asn, CategoryLabel, Record};

use super::ParseOutcome;
use crate::ingest::reader::{ReadError, Row, SourceContent};
use crate::ingest::report::RecordIssue;

pub const ASN_COLUMN: &str = "ASN";
pub const LAYER_1_COLUMN: &str = "Category 1 - Layer 1";
pub const LAYER_2_COLUMN: &str = "Category 1 - Layer 2";

pub fn parse_categories(
    path: &Path,
    content: &SourceContent,
) -> Result<ParseOutcome<Record>, ReadError> {
    let SourceContent::Rows(rows) = content else {
        return Err(ReadError::format(
            path,
            format!("expected CSV rows, got {}", content.shape()),
        ));
    };

    let mut outcome = ParseOutcome::default();
    for row in rows {
        if let Some(error) = &row.error {
            outcome.malformed(RecordIssue::malformed(path, row.line, error.clone()));
            continue;
        }
        match parse_row(row) {
            Ok(label) if !is_numeric_asn(&label.asn) => outcome.malformed(
                RecordIssue::malformed(
                    path,
                    row.line,
                    format!("'{}' is not a numeric ASN", label.asn),
                )
                .with_key(label.asn)
                .with_field(ASN_COLUMN),
            ),
            Ok(label) => outcome.push(Some(row.line), Record::Category(label)),
            Err(column) => outcome.malformed(
                RecordIssue::malformed(path, row.line, format!("missing value for '{column}'"))
                    .with_field(column),
            ),
        }
    }

    Ok(outcome)
}

/// Err carries the name of the missing column.
fn parse_row(row: &Row) -> Result<CategoryLabel, &'static str> {
    let asn = row
        .get(ASN_COLUMN)
        .map(normalize_asn)
        .filter(|asn| !asn.is_empty())
        .ok_or(ASN_COLUMN)?;

    Ok(CategoryLabel {
        asn,
        category_1: row.get(LAYER_1_COLUMN).ok_or(LAYER_1_COLUMN)?.to_string(),
        category_2: row.get(LAYER_2_COLUMN).ok_or(LAYER_2_COLUMN)?.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(line: usize, fields: &[(&str, &str)]) -> Row {
        Row::new(
            line,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_prefix_stripped_from_key() {
        let content = SourceContent::Rows(vec![row(
            2,
            &[
                (ASN_COLUMN, "AS64500"),
                (LAYER_1_COLUMN, "cdn"),
                (LAYER_2_COLUMN, "content"),
            ],
        )]);

        let outcome = parse_categories(Path::new("categories.csv"), &content).unwrap();
        assert_eq!(
            outcome.candidates[0].item,
            Record::Category(CategoryLabel {
                asn: "64500".to_string(),
                category_1: "cdn".to_string(),
                category_2: "content".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let content = SourceContent::Rows(vec![
            row(2, &[(ASN_COLUMN, "AS1"), (LAYER_1_COLUMN, "isp")]),
            row(3, &[(ASN_COLUMN, ""), (LAYER_1_COLUMN, "isp"), (LAYER_2_COLUMN, "")]),
            row(4, &[(ASN_COLUMN, "AS3"), (LAYER_1_COLUMN, "isp"), (LAYER_2_COLUMN, "")]),
        ]);

        let outcome = parse_categories(Path::new("categories.csv"), &content).unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(outcome.issues[0].field.as_deref(), Some(LAYER_2_COLUMN));
        assert_eq!(outcome.issues[1].field.as_deref(), Some(ASN_COLUMN));
        assert_eq!(outcome.issues[1].line, Some(3));
    }

    #[test]
    fn test_undecodable_and_non_numeric_rows_are_malformed() {
        let full = [(LAYER_1_COLUMN, "isp"), (LAYER_2_COLUMN, "")];
        let content = SourceContent::Rows(vec![
            row(2, &[(ASN_COLUMN, "AS1"), full[0], full[1]]),
            Row::undecodable(3, "invalid UTF-8 in column 'ASN'"),
            row(4, &[(ASN_COLUMN, "ASX"), full[0], full[1]]),
            row(5, &[(ASN_COLUMN, "3"), full[0], full[1]]),
        ]);

        let outcome = parse_categories(Path::new("categories.csv"), &content).unwrap();
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(outcome.issues[0].line, Some(3));
        assert!(outcome.issues[0].message.contains("UTF-8"));
        assert_eq!(outcome.issues[1].key.as_deref(), Some("X"));
    }

    #[test]
    fn test_rejects_lines() {
        let content = SourceContent::Lines(vec!["ASN,x".to_string()]);
        assert!(parse_categories(Path::new("categories.txt"), &content).is_err());
    }
}
