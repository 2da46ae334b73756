//! mdbatch core library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Everything between a raw metadata row and the remote repository client:
//!
//! - **Normalization**: [`normalize::Normalizer`] cleans cells per policy
//! - **Parsing**: [`parsers`] decode geolocation, link, authority link,
//!   typed relation and media track cells into [`FieldValue`]s
//! - **Validation**: [`validators`] and [`edtf`] check values against their grammars
//! - **Change detection**: [`fingerprint`] and [`dedupe`]
//! - **State**: [`store::StateStore`] and [`store::Repository`] keep the id
//!   map and fingerprint cache across runs
//! - **Orchestration**: [`checker::RowChecker`] runs rows through all of the above
//!
//! # Example
//!
//! ```no_run
//! use mdbatch_core::checker::{RowChecker, TaskMode};
//! use mdbatch_core::{Config, Repository, Row};
//!
//! fn prepare(rows: Vec<Row>) -> mdbatch_core::Result<()> {
//!     let config = Config::load("batch.yml")?;
//!     let repo = Repository::from_config(&config)?;
//!     let outcome = RowChecker::new(&config).run(rows, TaskMode::Execute, Some(&repo))?;
//!     for row in outcome.prepared.iter().filter(|row| !row.unchanged) {
//!         println!("{}", row.local_id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod checker;
pub mod config;
pub mod dedupe;
pub mod edtf;
pub mod error;
pub mod fingerprint;
pub mod language;
pub mod media;
pub mod normalize;
pub mod parsers;
pub mod paths;
pub mod row;
pub mod store;
pub mod text;
pub mod validators;
pub mod version;

// Re-export commonly used types
pub use config::Config;
pub use error::{CoreError, Result};
pub use fingerprint::Fingerprint;
pub use row::{FieldValue, Row};
pub use store::{Repository, StateStore};
