//! Error types for the mdbatch CLI
//!
//! Messages are user-facing and say what to fix where that is known.

use mdbatch_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration, validation or store failure from the core library
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The input file could not be opened or read as CSV
    #[error("Failed to read CSV file '{}': {source}", path.display())]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A data row is wider or narrower than the header row
    #[error(
        "Row {row} of your CSV file does not have the same number of columns ({columns}) \
         as there are headers ({headers})."
    )]
    ColumnCount {
        row: usize,
        columns: usize,
        headers: usize,
    },

    /// The header row lacks the configured id column
    #[error(
        "CSV file '{}' has no '{field}' column. Add it or set id_field in the configuration.",
        path.display()
    )]
    MissingIdColumn { path: PathBuf, field: String },

    /// `--delimiter` was not a single byte
    #[error("Delimiter must be a single character (or 'tab'), got '{0}'")]
    InvalidDelimiter(String),

    /// The target host is older than `minimum_host_version`
    #[error("Host version {found} is older than the configured minimum {minimum}")]
    UnsupportedHost { found: String, minimum: String },

    /// Check mode found problems; each one has already been printed
    #[error("{0} problem(s) found in the input data")]
    ChecksFailed(usize),

    /// Writing prepared rows failed
    #[error("Failed to serialize prepared row: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn csv_read(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::CsvRead {
            path: path.into(),
            source,
        }
    }
}
