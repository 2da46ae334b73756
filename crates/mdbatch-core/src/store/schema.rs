//! Table definitions for the local state store

use crate::error::{CoreError, Result};

pub const ID_MAP_TABLE: &str = "id_map";
pub const FINGERPRINTS_TABLE: &str = "fingerprints";

/// SQLite storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
}

impl ColumnType {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// A named table with a fixed column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` statement; every identifier is checked first
    pub fn create_sql(&self) -> Result<String> {
        validate_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(CoreError::store(format!("table '{}' has no columns", self.name)));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            validate_identifier(&column.name)?;
            let mut def = format!("{} {}", column.name, column.column_type.as_sql());
            if column.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.not_null {
                def.push_str(" NOT NULL");
            }
            columns.push(def);
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        ))
    }
}

/// Table and column names are spliced into statements, so they are limited
/// to `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::store(format!("'{name}' is not a valid table or column name")))
    }
}

/// Local row id -> remote object id, with the parent recorded at creation
pub fn id_map_table() -> TableSchema {
    TableSchema::new(
        ID_MAP_TABLE,
        vec![
            ColumnDef::text("local_id").primary_key(),
            ColumnDef::text("remote_id").not_null(),
            ColumnDef::text("parent_id"),
            ColumnDef::text("created_at").not_null(),
        ],
    )
}

/// Last fingerprint seen for each local row id
pub fn fingerprints_table() -> TableSchema {
    TableSchema::new(
        FINGERPRINTS_TABLE,
        vec![
            ColumnDef::text("local_id").primary_key(),
            ColumnDef::text("fingerprint").not_null(),
            ColumnDef::text("updated_at").not_null(),
        ],
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sql() {
        let sql = id_map_table().create_sql().unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS id_map (local_id TEXT PRIMARY KEY, \
             remote_id TEXT NOT NULL, parent_id TEXT, created_at TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("names").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1names").is_err());
        assert!(validate_identifier("names; DROP TABLE id_map").is_err());
        assert!(validate_identifier("name\"").is_err());
    }

    #[test]
    fn test_rejects_bad_schema() {
        assert!(TableSchema::new("empty", vec![]).create_sql().is_err());
        assert!(TableSchema::new("t", vec![ColumnDef::text("a b")]).create_sql().is_err());
    }
}
