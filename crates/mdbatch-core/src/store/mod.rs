//! Local state store
//!
//! A single SQLite file per run holding cross-run state: the local -> remote
//! id map and cached row fingerprints. [`StateStore`] is the generic layer:
//! named tables, typed values and equality filters. Every mutation runs in a
//! transaction that commits on success and rolls back when dropped; several
//! mutations can share one through [`StateStore::transaction`].
//! [`Repository`] sits on top with one method per logical operation.
//!
//! A store file has exactly one writer. Tasks running side by side must use
//! distinct files.

pub mod repository;
pub mod schema;

pub use repository::Repository;
pub use rusqlite::types::Value;
pub use schema::{ColumnDef, ColumnType, TableSchema};

use crate::error::{CoreError, Result};
use rusqlite::{params_from_iter, Connection, OpenFlags, Transaction};
use schema::validate_identifier;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Conjunction of `column IS value` conditions; empty matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// ` WHERE ...` with placeholders numbered from `first_param`
    fn where_clause(&self, first_param: usize) -> Result<(String, Vec<Value>)> {
        if self.conditions.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params = Vec::with_capacity(self.conditions.len());
        for (i, (column, value)) in self.conditions.iter().enumerate() {
            validate_identifier(column)?;
            clauses.push(format!("{column} IS ?{}", first_param + i));
            params.push(value.clone());
        }
        Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
    }
}

/// One selected row, columns in table order
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRow {
    columns: Vec<(String, Value)>,
}

impl StoreRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Generic transactional CRUD over one SQLite file
pub struct StateStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StateStore {
    /// Open the store file, creating it and its directory when missing
    pub fn create_database(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened state store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing store file for reading; never creates anything
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        debug!(path = %path.display(), "opened state store read-only");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Store that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_table(&self, table: &str) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Run `work` in one transaction
    ///
    /// Commits when `work` returns `Ok`. On any error nothing `work` did is
    /// kept.
    pub fn transaction<T>(&mut self, work: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let tx = StoreTx {
            tx: self.conn.transaction()?,
        };
        let value = work(&tx)?;
        tx.tx.commit()?;
        Ok(value)
    }

    /// Create a table unless it exists already
    pub fn create_table(&mut self, schema: &TableSchema) -> Result<()> {
        let sql = schema.create_sql()?;
        self.transaction(|tx| {
            tx.tx.execute(&sql, [])?;
            Ok(())
        })?;
        trace!(table = %schema.name, "ensured table");
        Ok(())
    }

    /// Insert one row and return its rowid
    pub fn insert(&mut self, table: &str, values: &[(&str, Value)]) -> Result<i64> {
        self.transaction(|tx| tx.insert(table, values))
    }

    /// Insert one row, replacing any row with the same primary key
    pub fn upsert(&mut self, table: &str, values: &[(&str, Value)]) -> Result<i64> {
        self.transaction(|tx| tx.upsert(table, values))
    }

    /// Matching rows in insertion order
    pub fn select(&self, table: &str, filter: &Filter) -> Result<Vec<StoreRow>> {
        validate_identifier(table)?;
        let (where_clause, params) = filter.where_clause(1)?;
        let sql = format!("SELECT * FROM {table}{where_clause} ORDER BY rowid");

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut columns = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    columns.push((name.clone(), row.get::<_, Value>(i)?));
                }
                Ok(StoreRow { columns })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self, table: &str, filter: &Filter) -> Result<usize> {
        validate_identifier(table)?;
        let (where_clause, params) = filter.where_clause(1)?;
        let sql = format!("SELECT COUNT(*) FROM {table}{where_clause}");
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        usize::try_from(count).map_err(|_| CoreError::store(format!("bad row count {count}")))
    }

    /// Set columns on matching rows; returns the number of rows changed
    pub fn update(
        &mut self,
        table: &str,
        values: &[(&str, Value)],
        filter: &Filter,
    ) -> Result<usize> {
        self.transaction(|tx| tx.update(table, values, filter))
    }

    /// Remove matching rows; returns the number removed
    pub fn delete(&mut self, table: &str, filter: &Filter) -> Result<usize> {
        self.transaction(|tx| tx.delete(table, filter))
    }
}

/// Mutations inside an open [`StateStore::transaction`]
pub struct StoreTx<'c> {
    tx: Transaction<'c>,
}

impl StoreTx<'_> {
    pub fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<i64> {
        let sql = insert_sql("INSERT", table, values)?;
        self.tx.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        let row_id = self.tx.last_insert_rowid();
        trace!(table, row_id, "inserted row");
        Ok(row_id)
    }

    pub fn upsert(&self, table: &str, values: &[(&str, Value)]) -> Result<i64> {
        let sql = insert_sql("INSERT OR REPLACE", table, values)?;
        self.tx.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        let row_id = self.tx.last_insert_rowid();
        trace!(table, row_id, "upserted row");
        Ok(row_id)
    }

    pub fn update(&self, table: &str, values: &[(&str, Value)], filter: &Filter) -> Result<usize> {
        validate_identifier(table)?;
        if values.is_empty() {
            return Err(CoreError::store(format!("update of '{table}' sets no columns")));
        }
        let mut assignments = Vec::with_capacity(values.len());
        for (i, (column, _)) in values.iter().enumerate() {
            validate_identifier(column)?;
            assignments.push(format!("{column} = ?{}", i + 1));
        }
        let (where_clause, filter_params) = filter.where_clause(values.len() + 1)?;
        let sql = format!("UPDATE {table} SET {}{where_clause}", assignments.join(", "));

        let params = values.iter().map(|(_, v)| v).chain(filter_params.iter());
        let changed = self.tx.execute(&sql, params_from_iter(params))?;
        trace!(table, changed, "updated rows");
        Ok(changed)
    }

    pub fn delete(&self, table: &str, filter: &Filter) -> Result<usize> {
        validate_identifier(table)?;
        let (where_clause, params) = filter.where_clause(1)?;
        let sql = format!("DELETE FROM {table}{where_clause}");
        let removed = self.tx.execute(&sql, params_from_iter(params.iter()))?;
        trace!(table, removed, "deleted rows");
        Ok(removed)
    }
}

fn insert_sql(verb: &str, table: &str, values: &[(&str, Value)]) -> Result<String> {
    validate_identifier(table)?;
    if values.is_empty() {
        return Err(CoreError::store(format!("insert into '{table}' has no values")));
    }
    let mut columns = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (i, (column, _)) in values.iter().enumerate() {
        validate_identifier(column)?;
        columns.push(*column);
        placeholders.push(format!("?{}", i + 1));
    }
    Ok(format!(
        "{verb} INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    ))
}
