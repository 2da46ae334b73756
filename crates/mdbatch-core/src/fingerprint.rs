//! Row fingerprints for change detection
//!
//! A fingerprint is the MD5 digest of every field name and exact value in
//! row order. Each name and value is framed as `<byte length>:<bytes>`, so
//! renaming a field, adding an empty one, moving text across a field
//! boundary or changing whitespace all change the digest. It only detects
//! changes between runs; it is not a security hash.

use crate::error::CoreError;
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a digest read back from the store
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

/// Parses a digest echoed back by the remote client; case-insensitive
impl FromStr for Fingerprint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidFingerprint(s.to_string()));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a row
pub fn fingerprint_row(row: &Row) -> Fingerprint {
    fingerprint_fields(row.iter())
}

/// Fingerprint `(name, value)` pairs given in order; non-string values are
/// formatted first
pub fn fingerprint_fields<I, K, V>(fields: I) -> Fingerprint
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let mut context = md5::Context::new();
    for (name, value) in fields {
        frame(&mut context, name.as_ref());
        frame(&mut context, &value.to_string());
    }
    Fingerprint(format!("{:x}", context.compute()))
}

fn frame(context: &mut md5::Context, part: &str) {
    context.consume(format!("{}:", part.len()).as_bytes());
    context.consume(part.as_bytes());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn golden_row() -> Row {
        [
            ("one", "eijco87we "),
            ("two", "jjjclsle300sloww"),
            ("three", "pppzzffr46wkkw"),
            ("four", ""),
            ("six", "5"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_golden_value() {
        let fp = fingerprint_row(&golden_row());
        assert_eq!(fp.as_str(), "c476e6054f1d514847d4f3d1a48facb8");
    }

    #[test]
    fn test_numeric_values_format_like_text() {
        let fields: Vec<(&str, Box<dyn fmt::Display>)> = vec![
            ("one", Box::new("eijco87we ")),
            ("two", Box::new("jjjclsle300sloww")),
            ("three", Box::new("pppzzffr46wkkw")),
            ("four", Box::new("")),
            ("six", Box::new(5)),
        ];
        assert_eq!(fingerprint_fields(fields), fingerprint_row(&golden_row()));
    }

    #[test]
    fn test_changes_alter_digest() {
        let base = fingerprint_row(&golden_row());

        let mut changed = golden_row();
        changed.insert("two", "jjjclsle300slowx");
        assert_ne!(fingerprint_row(&changed), base);

        let reordered: Row = [("two", "b"), ("one", "a")].into_iter().collect();
        let ordered: Row = [("one", "a"), ("two", "b")].into_iter().collect();
        assert_ne!(fingerprint_row(&reordered), fingerprint_row(&ordered));

        let mut added = golden_row();
        added.insert("seven", "x");
        assert_ne!(fingerprint_row(&added), base);
    }

    #[test]
    fn test_renamed_field_alters_digest() {
        let renamed: Row = golden_row()
            .iter()
            .map(|(name, value)| (if name == "six" { "seven" } else { name }, value))
            .collect();
        assert_ne!(fingerprint_row(&renamed), fingerprint_row(&golden_row()));
    }

    #[test]
    fn test_added_empty_field_alters_digest() {
        let mut added = golden_row();
        added.insert("seven", "");
        assert_ne!(fingerprint_row(&added), fingerprint_row(&golden_row()));
    }

    #[test]
    fn test_field_boundaries_are_framed() {
        let left: Row = [("a", "x y"), ("b", "z")].into_iter().collect();
        let right: Row = [("a", "x"), ("b", "y z")].into_iter().collect();
        assert_ne!(fingerprint_row(&left), fingerprint_row(&right));

        let glued: Row = [("ab", "1"), ("c", "2")].into_iter().collect();
        let split: Row = [("a", "b1"), ("c", "2")].into_iter().collect();
        assert_ne!(fingerprint_row(&glued), fingerprint_row(&split));
    }

    #[test]
    fn test_whitespace_edit_alters_digest() {
        let double: Row = [("title", "a  b")].into_iter().collect();
        let single: Row = [("title", "a b")].into_iter().collect();
        assert_ne!(fingerprint_row(&double), fingerprint_row(&single));
    }

    #[test]
    fn test_fixed_length_hex() {
        let fp = fingerprint_row(&Row::new());
        assert_eq!(fp.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
        assert!(fp.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_echoed_digest() {
        let fp = fingerprint_row(&golden_row());
        let echoed: Fingerprint = fp.as_str().to_uppercase().parse().unwrap();
        assert_eq!(echoed, fp);

        assert!("c476e6054f1d514847d4f3d1a48facb".parse::<Fingerprint>().is_err());
        assert!("z476e6054f1d514847d4f3d1a48facb8".parse::<Fingerprint>().is_err());
        assert!("".parse::<Fingerprint>().is_err());
    }
}
