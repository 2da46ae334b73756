//! Cell cleanup applied before parsing and validation
//!
//! Steps run in a fixed order on every cell:
//!
//! 1. `outside_spaces`: trim leading and trailing whitespace
//! 2. `inside_spaces`: collapse interior whitespace runs to one space
//! 3. `smart_quotes`: curly quotes become straight ASCII quotes
//! 4. carriage returns and newlines are removed (always on)
//! 5. `outside_subdelimiters`: drop leading/trailing subdelimiters and
//!    collapse repeated adjacent ones
//!
//! Disabling a step leaves its concern untouched while the rest still apply.

use crate::config::Config;
use crate::row::Row;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A normalization step that can be skipped through configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStep {
    OutsideSpaces,
    InsideSpaces,
    SmartQuotes,
    OutsideSubdelimiters,
}

/// Which optional steps are enabled; all of them by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationPolicy {
    outside_spaces: bool,
    inside_spaces: bool,
    smart_quotes: bool,
    outside_subdelimiters: bool,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            outside_spaces: true,
            inside_spaces: true,
            smart_quotes: true,
            outside_subdelimiters: true,
        }
    }
}

impl NormalizationPolicy {
    /// Everything enabled except the listed steps
    pub fn from_skip(skip: &[NormalizationStep]) -> Self {
        let mut policy = Self::default();
        for step in skip {
            policy.set(*step, false);
        }
        policy
    }

    pub fn set(&mut self, step: NormalizationStep, enabled: bool) {
        match step {
            NormalizationStep::OutsideSpaces => self.outside_spaces = enabled,
            NormalizationStep::InsideSpaces => self.inside_spaces = enabled,
            NormalizationStep::SmartQuotes => self.smart_quotes = enabled,
            NormalizationStep::OutsideSubdelimiters => self.outside_subdelimiters = enabled,
        }
    }

    pub fn is_enabled(&self, step: NormalizationStep) -> bool {
        match step {
            NormalizationStep::OutsideSpaces => self.outside_spaces,
            NormalizationStep::InsideSpaces => self.inside_spaces,
            NormalizationStep::SmartQuotes => self.smart_quotes,
            NormalizationStep::OutsideSubdelimiters => self.outside_subdelimiters,
        }
    }
}

/// Applies a [`NormalizationPolicy`] to cells and rows
#[derive(Debug, Clone)]
pub struct Normalizer {
    policy: NormalizationPolicy,
    subdelimiter: String,
}

impl Normalizer {
    pub fn new(policy: NormalizationPolicy, subdelimiter: impl Into<String>) -> Self {
        Self {
            policy,
            subdelimiter: subdelimiter.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.normalization_policy(), config.subdelimiter.clone())
    }

    /// Clean a whole row; the input row is left as it was
    pub fn normalize_row(&self, row: &Row) -> Row {
        row.map_values(|name, value| {
            let cleaned = self.normalize_value(value);
            if cleaned != value {
                trace!(field = %name, before = %value, after = %cleaned, "normalized cell");
            }
            cleaned
        })
    }

    /// Clean a single cell
    pub fn normalize_value(&self, value: &str) -> String {
        let mut value = if self.policy.outside_spaces {
            value.trim().to_string()
        } else {
            value.to_string()
        };

        if self.policy.inside_spaces {
            value = collapse_inside_whitespace(&value);
        }

        if self.policy.smart_quotes {
            value = straighten_quotes(&value);
        }

        value.retain(|c| c != '\n' && c != '\r');

        if self.policy.outside_subdelimiters && !self.subdelimiter.is_empty() {
            value = collapse_subdelimiters(&value, &self.subdelimiter);
            loop {
                let mut stripped = strip_outer_subdelimiters(&value, &self.subdelimiter);
                if self.policy.outside_spaces {
                    stripped = stripped.trim();
                }
                if stripped.len() == value.len() {
                    break;
                }
                value = stripped.to_string();
            }
        }

        value
    }
}

/// Collapse whitespace runs between non-whitespace characters; leading and
/// trailing whitespace is the concern of `outside_spaces` and is kept as is.
fn collapse_inside_whitespace(value: &str) -> String {
    let core = value.trim();
    if core.is_empty() {
        return value.to_string();
    }
    let start = value.len() - value.trim_start().len();
    let end = value.trim_end().len();

    let mut collapsed = String::with_capacity(value.len());
    collapsed.push_str(&value[..start]);
    let mut in_run = false;
    for c in core.chars() {
        if c.is_whitespace() {
            if !in_run {
                collapsed.push(' ');
                in_run = true;
            }
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }
    collapsed.push_str(&value[end..]);
    collapsed
}

fn straighten_quotes(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            other => other,
        })
        .collect()
}

fn collapse_subdelimiters(value: &str, subdelimiter: &str) -> String {
    let doubled = subdelimiter.repeat(2);
    let mut value = value.to_string();
    while value.contains(&doubled) {
        value = value.replace(&doubled, subdelimiter);
    }
    value
}

fn strip_outer_subdelimiters<'a>(value: &'a str, subdelimiter: &str) -> &'a str {
    let mut trimmed = value;
    while let Some(rest) = trimmed.strip_prefix(subdelimiter) {
        trimmed = rest;
    }
    while let Some(rest) = trimmed.strip_suffix(subdelimiter) {
        trimmed = rest;
    }
    trimmed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn normalizer(skip: &[NormalizationStep], subdelimiter: &str) -> Normalizer {
        Normalizer::new(NormalizationPolicy::from_skip(skip), subdelimiter)
    }

    #[test]
    fn test_all_steps() {
        let n = normalizer(&[], "|");
        let row: Row = [
            ("one", " blsidlw  "),
            ("two", "hheo \"s7s9w9\""),
            ("three", "b\u{2018}bbbbb\u{2019}"),
            ("four", "لدولي, العاشر []ليونيكود "),
            ("five", "\nnew lines\n"),
            ("six", "a  b c    d  e"),
        ]
        .into_iter()
        .collect();

        let clean = n.normalize_row(&row);
        let expected: Row = [
            ("one", "blsidlw"),
            ("two", "hheo \"s7s9w9\""),
            ("three", "b'bbbbb'"),
            ("four", "لدولي, العاشر []ليونيكود"),
            ("five", "new lines"),
            ("six", "a b c d e"),
        ]
        .into_iter()
        .collect();
        assert_eq!(clean, expected);
        assert_eq!(row.get("one"), Some(" blsidlw  "));
    }

    #[test]
    fn test_skip_smart_quotes() {
        let n = normalizer(&[NormalizationStep::SmartQuotes], "|");
        assert_eq!(n.normalize_value("b\u{2018}bbxbbb\u{2019}"), "b\u{2018}bbxbbb\u{2019}");
    }

    #[test]
    fn test_skip_spaces_keeps_whitespace_but_drops_newlines() {
        let n = normalizer(
            &[NormalizationStep::InsideSpaces, NormalizationStep::OutsideSpaces],
            "|",
        );
        assert_eq!(n.normalize_value(" blsidlw  "), " blsidlw  ");
        assert_eq!(n.normalize_value("a  b c    d  e"), "a  b c    d  e");
        assert_eq!(n.normalize_value("b\u{2018}bbbbb\u{2019}"), "b'bbbbb'");
        assert_eq!(n.normalize_value("\nnew lines\r\n"), "new lines");
    }

    #[test]
    fn test_inside_spaces_leaves_edges_alone() {
        let n = normalizer(&[NormalizationStep::OutsideSpaces], "|");
        assert_eq!(n.normalize_value("  a   b  "), "  a b  ");
    }

    #[test]
    fn test_outside_subdelimiters() {
        let n = normalizer(&[], "|");
        assert_eq!(n.normalize_value(" |blsidlw  "), "blsidlw");
        assert_eq!(n.normalize_value("something|"), "something");
        assert_eq!(n.normalize_value("something||"), "something");
        assert_eq!(n.normalize_value("a|||b"), "a|b");

        let n = normalizer(&[], "%%");
        assert_eq!(n.normalize_value(" %%blsidlw  "), "blsidlw");
        assert_eq!(n.normalize_value("something%%"), "something");
    }

    #[test]
    fn test_skip_outside_steps() {
        let n = normalizer(
            &[NormalizationStep::OutsideSpaces, NormalizationStep::OutsideSubdelimiters],
            "|",
        );
        assert_eq!(n.normalize_value(" |blsidlw"), " |blsidlw");
        assert_eq!(n.normalize_value("something|"), "something|");
        assert_eq!(n.normalize_value("something||"), "something||");
    }

    #[test]
    fn test_spaces_between_subdelimiters() {
        let n = normalizer(&[], "|");
        assert_eq!(n.normalize_value("| |a"), "a");
        assert_eq!(n.normalize_value("a | "), "a");
    }

    #[test]
    fn test_blank_cell() {
        let n = normalizer(&[], "|");
        assert_eq!(n.normalize_value("   "), "");
        assert_eq!(n.normalize_value("|"), "");
    }
}
