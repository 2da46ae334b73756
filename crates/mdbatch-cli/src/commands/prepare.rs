//! `mdbatch prepare` command implementation
//!
//! Writes one JSON object per prepared row to stdout. Nothing is cached
//! here: a row counts as unchanged only after its write-back was recorded
//! with `store map --fingerprint`.

use super::load_batch;
use crate::error::Result;
use crate::InputArgs;
use mdbatch_core::checker::{PreparedRow, RowChecker, TaskMode};
use mdbatch_core::Repository;
use std::io::{self, BufWriter, Write};
use tracing::info;

pub fn run(args: &InputArgs, all: bool) -> Result<()> {
    let (config, input) = load_batch(args)?;
    let repo = Repository::from_config(&config)?;
    let outcome = RowChecker::new(&config).run(input.rows, TaskMode::Execute, Some(&repo))?;

    let stdout = io::stdout();
    let written = write_rows(stdout.lock(), &outcome.prepared, all)?;

    info!(
        prepared = outcome.prepared.len(),
        written,
        skipped = outcome.prepared.len() - written,
        "prepare finished"
    );
    Ok(())
}

/// Write rows as JSON lines, skipping unchanged ones unless `all` is set;
/// returns how many were written
pub fn write_rows<W: Write>(writer: W, rows: &[PreparedRow], all: bool) -> Result<usize> {
    let mut writer = BufWriter::new(writer);
    let mut written = 0;
    for row in rows.iter().filter(|row| all || !row.unchanged) {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
