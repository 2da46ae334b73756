//! `mdbatch store` command implementations

use super::load_config;
use crate::error::Result;
use mdbatch_core::{Fingerprint, Repository};
use std::path::Path;
use tracing::info;

/// Record `local_id -> remote_id` after the host wrote the object
///
/// With `fingerprint` the row's content is cached too, so the next
/// `prepare` skips it until it changes.
pub fn map(
    config: &Path,
    local_id: &str,
    remote_id: &str,
    parent_id: Option<&str>,
    fingerprint: Option<&str>,
) -> Result<()> {
    let fingerprint = fingerprint.map(str::parse::<Fingerprint>).transpose()?;
    let mut repo = Repository::from_config(&load_config(config)?)?;
    repo.record_write_back(local_id, remote_id, parent_id, fingerprint.as_ref())?;
    println!("Mapped {local_id} to {remote_id}.");
    Ok(())
}

/// Undo a mapping, e.g. after the remote object was rolled back
pub fn unmap(config: &Path, local_id: &str) -> Result<()> {
    let mut repo = Repository::from_config(&load_config(config)?)?;
    if repo.remove_remote_id(local_id)? {
        println!("Removed the mapping for {local_id}.");
    } else {
        println!("No mapping recorded for {local_id}.");
    }
    Ok(())
}

pub fn show(config: &Path, local_id: &str) -> Result<()> {
    let repo = Repository::from_config(&load_config(config)?)?;
    match repo.remote_id_for(local_id)? {
        Some(remote_id) => println!("{local_id} -> {remote_id}"),
        None => println!("No mapping recorded for {local_id}."),
    }
    if let Some(fingerprint) = repo.cached_fingerprint(local_id)? {
        println!("Cached fingerprint: {fingerprint}");
    }
    Ok(())
}

pub fn clear(config: &Path) -> Result<()> {
    let config = load_config(config)?;
    let mut repo = Repository::from_config(&config)?;
    repo.clear()?;
    info!(store = %config.store_path().display(), "cleared local state");
    println!("Cleared local state in {}.", config.store_path().display());
    Ok(())
}
