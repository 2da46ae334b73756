//! Rows and field values
//!
//! A [`Row`] is one input record: an ordered list of uniquely named cells.
//! Field order matters for fingerprinting, so rows keep insertion order.
//! A [`FieldValue`] is what a cell becomes after parsing.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// One input record with ordered, uniquely named cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, keeping the original position if the name already exists
    ///
    /// Returns the previous value for that name, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.cells.push((name, value));
                None
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Build a new row by transforming every value; names and order are kept
    pub fn map_values(&self, mut f: impl FnMut(&str, &str) -> String) -> Row {
        Row {
            cells: self
                .cells
                .iter()
                .map(|(name, value)| (name.clone(), f(name, value)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A parsed field value
///
/// Composites compare structurally: key order never matters and nested
/// composites are compared recursively, which is what deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Composite(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Build a composite from key/value pairs
    pub fn composite<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        FieldValue::Composite(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a key of a composite value
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Composite(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Composite(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keeps_insertion_order() {
        let row: Row = [("id", "1"), ("title", "A"), ("parent_id", "")].into_iter().collect();
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["id", "title", "parent_id"]);
    }

    #[test]
    fn test_row_insert_replaces_in_place() {
        let mut row: Row = [("id", "1"), ("title", "A")].into_iter().collect();
        assert_eq!(row.insert("id", "2"), Some("1".to_string()));
        assert_eq!(row.iter().next(), Some(("id", "2")));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_row_serializes_in_order() {
        let row: Row = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn test_composite_equality_ignores_key_order() {
        let left = FieldValue::composite([("a", FieldValue::from(1)), ("b", FieldValue::from(2))]);
        let right = FieldValue::composite([("b", FieldValue::from(2)), ("a", FieldValue::from(1))]);
        assert_eq!(left, right);
    }

    #[test]
    fn test_field_value_json_shape() {
        let value = FieldValue::composite([
            ("target_id", FieldValue::from(5)),
            ("rel_type", FieldValue::from("relators:pht")),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"rel_type":"relators:pht","target_id":5}"#
        );
    }
}
