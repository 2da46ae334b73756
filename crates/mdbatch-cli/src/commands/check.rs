//! `mdbatch check` command implementation
//!
//! Runs every row through the checker in check mode and prints each issue.
//! The state store is only read, and only when it already exists.

use super::load_batch;
use crate::error::{CliError, Result};
use crate::InputArgs;
use mdbatch_core::checker::{RowChecker, TaskMode};
use mdbatch_core::Repository;
use tracing::info;

pub fn run(args: &InputArgs, host_version: Option<&str>) -> Result<()> {
    let (config, input) = load_batch(args)?;

    if let Some(found) = host_version {
        if !config.host_version_supported(found)? {
            return Err(CliError::UnsupportedHost {
                found: found.to_string(),
                minimum: config.minimum_host_version.clone().unwrap_or_default(),
            });
        }
    }

    println!(
        "OK, all {} rows in the CSV file have the same number of columns \
         as there are headers ({}).",
        input.rows.len(),
        input.headers.len()
    );

    let repo = Repository::open_existing(config.store_path())?;
    let outcome = RowChecker::new(&config).run(input.rows, TaskMode::Check, repo.as_ref())?;
    let unchanged = outcome.prepared.iter().filter(|row| row.unchanged).count();
    info!(rows = outcome.report.rows_checked, unchanged, "check finished");

    if !outcome.report.is_valid() {
        for issue in &outcome.report.issues {
            println!("{}", issue.message);
        }
        return Err(CliError::ChecksFailed(outcome.report.issues.len()));
    }

    if unchanged > 0 {
        println!("{unchanged} row(s) are unchanged since the last run and would be skipped.");
    }
    println!("Configuration and input data appear to be valid.");
    Ok(())
}
