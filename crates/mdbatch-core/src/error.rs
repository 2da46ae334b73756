//! Error types for the mdbatch core
//!
//! Errors fall into three classes that callers treat differently:
//!
//! 1. malformed micro-format values ([`CoreError::MalformedValue`])
//! 2. semantic violations ([`CoreError::Semantic`], [`CoreError::OrderingViolation`])
//! 3. store and I/O failures, which are always fatal
//!
//! In check mode classes 1 and 2 are collected per row; in execute mode the
//! first one stops the run before anything is handed to the remote client.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cell could not be decoded as its declared micro-format
    #[error("Row \"{row}\", field \"{field}\": value \"{value}\" {reason}")]
    MalformedValue {
        row: String,
        field: String,
        value: String,
        reason: String,
    },

    /// A well-formed value breaks a semantic rule
    #[error("Row \"{row}\": {message}")]
    Semantic { row: String, message: String },

    /// A child row appears before the row it names as parent
    #[error("Row \"{child}\" must come after its parent \"{parent}\" in the input")]
    OrderingViolation { child: String, parent: String },

    /// Text handed in as a row fingerprint is not an MD5 hex digest
    #[error("\"{0}\" is not a row fingerprint; expected 32 hex characters")]
    InvalidFingerprint(String),

    /// Local state store failure (SQLite)
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Local state store failure detected outside SQLite
    #[error("Store error: {0}")]
    StoreFailure(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] mdbatch_common::CommonError),
}

impl CoreError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error that did not originate in SQLite
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    /// Create a malformed-value error
    pub fn malformed(
        row: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedValue {
            row: row.into(),
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a semantic violation
    pub fn semantic(row: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Semantic {
            row: row.into(),
            message: message.into(),
        }
    }

    /// Store and I/O failures can desynchronize the id map or the
    /// fingerprint cache, so they abort the run in every mode.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::Store(_)
                | CoreError::StoreFailure(_)
                | CoreError::Io(_)
                | CoreError::Config(_)
                | CoreError::Common(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(!CoreError::malformed("r1", "field_geo", "1 2", "is not lat,lng").is_fatal());
        assert!(!CoreError::OrderingViolation {
            child: "c2p2".into(),
            parent: "p2".into()
        }
        .is_fatal());
        assert!(CoreError::store("disk full").is_fatal());
    }

    #[test]
    fn test_ordering_message_names_child() {
        let err = CoreError::OrderingViolation {
            child: "c2p2".into(),
            parent: "p2".into(),
        };
        assert!(err.to_string().contains("\"c2p2\" must come after"));
    }
}
