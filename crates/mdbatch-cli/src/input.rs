//! CSV input
//!
//! Reads the whole input file up front so that column-count problems are
//! reported before any row is checked.

use crate::error::{CliError, Result};
use mdbatch_core::Row;
use std::path::Path;
use tracing::debug;

/// Rows starting with this marker in their first cell are skipped
pub const COMMENT_MARKER: char = '#';

/// Parsed input file
#[derive(Debug, Clone, PartialEq)]
pub struct CsvInput {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl CsvInput {
    /// Fail unless the header row has a column named `field`
    pub fn require_column(&self, path: &Path, field: &str) -> Result<()> {
        if self.headers.iter().any(|h| h == field) {
            Ok(())
        } else {
            Err(CliError::MissingIdColumn {
                path: path.to_path_buf(),
                field: field.to_string(),
            })
        }
    }
}

/// Parse a `--delimiter` value: a single byte, or `tab`/`\t`
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if value.len() == 1 => Ok(value.as_bytes()[0]),
        _ => Err(CliError::InvalidDelimiter(value.to_string())),
    }
}

/// Read a CSV file into rows keyed by header name
///
/// Header names are trimmed. Data rows are numbered from 1, not counting
/// comment rows.
pub fn read_csv(path: &Path, delimiter: u8) -> Result<CsvInput> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CliError::csv_read(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CliError::csv_read(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| CliError::csv_read(path, e))?;
        if record.get(0).is_some_and(|cell| cell.starts_with(COMMENT_MARKER)) {
            debug!(line = record.position().map(|p| p.line()), "skipping comment row");
            continue;
        }

        if record.len() != headers.len() {
            return Err(CliError::ColumnCount {
                row: rows.len() + 1,
                columns: record.len(),
                headers: headers.len(),
            });
        }
        rows.push(headers.iter().map(String::as_str).zip(record.iter()).collect());
    }

    debug!(path = %path.display(), rows = rows.len(), "read CSV input");
    Ok(CsvInput { headers, rows })
}
