//! mdbatch common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared pieces used by every mdbatch workspace member:
//!
//! - **Error Handling**: [`CommonError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by [`logging::LogConfig`]
//! - **Checksums**: fixity digests for media files
//! - **Types**: small shared enums such as [`types::ChecksumAlgorithm`]
//!
//! # Example
//!
//! ```no_run
//! use mdbatch_common::checksum::compute_file_checksum;
//! use mdbatch_common::types::ChecksumAlgorithm;
//!
//! fn fixity(path: &str) -> mdbatch_common::Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Sha256)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
