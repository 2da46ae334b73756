//! Non-colliding sibling file paths

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static NUMERIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)$").expect("suffix regex is valid"));

/// Derive the next sibling path for a file that may already exist
///
/// A stem ending in `_<digits>` gets that number plus one, unpadded
/// (`dog_05.zip` -> `dog_6.zip`); any other stem gets `_1`. The extension is
/// kept. Feeding the result back in always advances the suffix.
pub fn dedupe_file_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let next_stem = match NUMERIC_SUFFIX.captures(&stem).and_then(|caps| {
        let digits = caps.get(1)?;
        let next = digits.as_str().parse::<u64>().ok()?.checked_add(1)?;
        Some(format!("{}_{next}", &stem[..digits.start() - 1]))
    }) {
        Some(next) => next,
        None => format!("{stem}_1"),
    };

    let file_name = match path.extension() {
        Some(ext) => format!("{next_stem}.{}", ext.to_string_lossy()),
        None => next_stem,
    };
    path.with_file_name(file_name)
}
