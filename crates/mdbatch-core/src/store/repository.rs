//! Typed operations over the state store
//!
//! Callers ask for what they need ("remote id of row p2", "cached
//! fingerprint of row 7") and never see table names or statements.

use super::schema::{fingerprints_table, id_map_table, FINGERPRINTS_TABLE, ID_MAP_TABLE};
use super::{Filter, StateStore, StoreTx, Value};
use crate::config::Config;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use chrono::Utc;
use std::path::Path;
use tracing::debug;

pub struct Repository {
    store: StateStore,
}

impl Repository {
    /// Open (or create) the store file and make sure its tables exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_store(StateStore::create_database(path)?)
    }

    /// Open the store this configuration points at
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.store_path())
    }

    /// Open an existing store read-only
    ///
    /// `None` when the file is missing or was never initialized, so read-only
    /// callers leave no file behind.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        let store = StateStore::open_read_only(path)?;
        if !store.has_table(ID_MAP_TABLE)? || !store.has_table(FINGERPRINTS_TABLE)? {
            return Ok(None);
        }
        Ok(Some(Self { store }))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_store(StateStore::open_in_memory()?)
    }

    fn with_store(mut store: StateStore) -> Result<Self> {
        store.create_table(&id_map_table())?;
        store.create_table(&fingerprints_table())?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Remember the remote object created for a local row
    pub fn record_remote_id(
        &mut self,
        local_id: &str,
        remote_id: &str,
        parent_id: Option<&str>,
    ) -> Result<()> {
        self.store.transaction(|tx| upsert_mapping(tx, local_id, remote_id, parent_id))?;
        debug!(local_id, remote_id, "recorded remote id");
        Ok(())
    }

    /// Record a completed write-back: the remote id and, when given, the
    /// fingerprint of the row as written, in one transaction
    pub fn record_write_back(
        &mut self,
        local_id: &str,
        remote_id: &str,
        parent_id: Option<&str>,
        fingerprint: Option<&Fingerprint>,
    ) -> Result<()> {
        self.store.transaction(|tx| {
            upsert_mapping(tx, local_id, remote_id, parent_id)?;
            if let Some(fingerprint) = fingerprint {
                upsert_fingerprint(tx, local_id, fingerprint)?;
            }
            Ok(())
        })?;
        debug!(local_id, remote_id, cached = fingerprint.is_some(), "recorded write-back");
        Ok(())
    }

    pub fn remote_id_for(&self, local_id: &str) -> Result<Option<String>> {
        let rows = self.store.select(ID_MAP_TABLE, &by_local_id(local_id))?;
        Ok(rows
            .first()
            .and_then(|row| row.get_text("remote_id"))
            .map(str::to_string))
    }

    pub fn is_mapped(&self, local_id: &str) -> Result<bool> {
        Ok(self.store.count(ID_MAP_TABLE, &by_local_id(local_id))? > 0)
    }

    /// Forget a mapping, e.g. after the remote object was rolled back
    pub fn remove_remote_id(&mut self, local_id: &str) -> Result<bool> {
        Ok(self.store.delete(ID_MAP_TABLE, &by_local_id(local_id))? > 0)
    }

    pub fn cache_fingerprint(&mut self, local_id: &str, fingerprint: &Fingerprint) -> Result<()> {
        self.store.transaction(|tx| upsert_fingerprint(tx, local_id, fingerprint))
    }

    pub fn cached_fingerprint(&self, local_id: &str) -> Result<Option<Fingerprint>> {
        let rows = self.store.select(FINGERPRINTS_TABLE, &by_local_id(local_id))?;
        Ok(rows
            .first()
            .and_then(|row| row.get_text("fingerprint"))
            .map(Fingerprint::from_hex))
    }

    /// True when the cached fingerprint for the row equals `fingerprint`
    pub fn is_unchanged(&self, local_id: &str, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self.cached_fingerprint(local_id)?.as_ref() == Some(fingerprint))
    }

    /// Drop all cached state; either both tables are emptied or neither is
    pub fn clear(&mut self) -> Result<()> {
        let (mapped, cached) = self.store.transaction(|tx| {
            let mapped = tx.delete(ID_MAP_TABLE, &Filter::all())?;
            let cached = tx.delete(FINGERPRINTS_TABLE, &Filter::all())?;
            Ok((mapped, cached))
        })?;
        debug!(mapped, cached, "cleared state store");
        Ok(())
    }
}

fn upsert_mapping(
    tx: &StoreTx<'_>,
    local_id: &str,
    remote_id: &str,
    parent_id: Option<&str>,
) -> Result<()> {
    tx.upsert(
        ID_MAP_TABLE,
        &[
            ("local_id", text(local_id)),
            ("remote_id", text(remote_id)),
            ("parent_id", parent_id.map(text).unwrap_or(Value::Null)),
            ("created_at", text(&Utc::now().to_rfc3339())),
        ],
    )?;
    Ok(())
}

fn upsert_fingerprint(tx: &StoreTx<'_>, local_id: &str, fingerprint: &Fingerprint) -> Result<()> {
    tx.upsert(
        FINGERPRINTS_TABLE,
        &[
            ("local_id", text(local_id)),
            ("fingerprint", text(fingerprint.as_str())),
            ("updated_at", text(&Utc::now().to_rfc3339())),
        ],
    )?;
    Ok(())
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn by_local_id(local_id: &str) -> Filter {
    Filter::eq("local_id", text(local_id))
}
