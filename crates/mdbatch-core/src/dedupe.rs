//! Removal of semantically duplicate field values
//!
//! Equality is structural: composites match when they hold the same keys
//! with equal values, whatever order the keys were inserted in, recursively.

use crate::row::FieldValue;
use std::collections::HashSet;

/// Drop repeated values, keeping the first occurrence of each
pub fn deduplicate(values: &[FieldValue]) -> Vec<FieldValue> {
    let mut seen: HashSet<&FieldValue> = HashSet::with_capacity(values.len());
    values
        .iter()
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}
