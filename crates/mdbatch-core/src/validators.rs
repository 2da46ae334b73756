//! Value validators
//!
//! Pure predicates over raw cell values (or single groups of them). None of
//! them allocate results or report partial matches; callers turn a `false`
//! into a row issue with their own context.

use crate::language::is_supported_language;
use crate::parsers::{parse_media_track, LINK_PART_SEPARATOR};
use chrono::DateTime;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub use crate::edtf::validate_edtf;

/// Media track kinds accepted by the repository
pub const MEDIA_TRACK_KINDS: &[&str] = &["subtitles", "captions"];

#[allow(clippy::expect_used)]
static LATLONG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[+-]?([1-8]?\d(\.\d+)?|90(\.0+)?),\s*[+-]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)$",
    )
    .expect("latlong regex is valid")
});

#[allow(clippy::expect_used)]
static CREATED_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{2}:?\d{2}$")
        .expect("created date regex is valid")
});

/// Exact, case-sensitive match against `allowed`
pub fn validate_language_code(code: &str, allowed: &[&str]) -> bool {
    is_supported_language(code, allowed)
}

/// `lat,lng` with latitude in [-90, 90] and longitude in [-180, 180]
pub fn validate_latlong(value: &str) -> bool {
    LATLONG_REGEX.is_match(value)
}

/// `http(s)://...`, optionally followed by `%%title`
pub fn validate_link(value: &str) -> bool {
    let uri = match value.split_once(LINK_PART_SEPARATOR) {
        Some((uri, _title)) => uri,
        None => value,
    }
    .trim();
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        return false;
    }
    match Url::parse(uri) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// `source%%uri[%%title]` with a known source and a valid uri; blanks
/// around each part are ignored
pub fn validate_authority_link<S: AsRef<str>>(value: &str, sources: &[S]) -> bool {
    let mut parts = value.splitn(3, LINK_PART_SEPARATOR).map(str::trim);
    let (Some(source), Some(uri)) = (parts.next(), parts.next()) else {
        return false;
    };
    sources.iter().any(|allowed| allowed.as_ref() == source) && validate_link(uri)
}

/// `label:kind:srclang:file_path` with a non-empty label, a known kind and
/// language, and a `.vtt` file
pub fn validate_media_track(value: &str, languages: &[&str]) -> bool {
    let Ok(track) = parse_media_track(value) else {
        return false;
    };
    !track.label.trim().is_empty()
        && MEDIA_TRACK_KINDS.contains(&track.kind.as_str())
        && validate_language_code(&track.srclang, languages)
        && track.file_path.to_lowercase().ends_with(".vtt")
}

/// `YYYY-MM-DDTHH:MM:SS` followed by an explicit `+HH:MM` or `+HHMM` offset
pub fn validate_created_date(value: &str) -> bool {
    if !CREATED_DATE_REGEX.is_match(value) {
        return false;
    }
    let compact = match value.len() {
        25 => {
            let (datetime, offset) = value.split_at(22);
            format!("{datetime}{}", offset.replacen(':', "", 1))
        },
        _ => value.to_string(),
    };
    DateTime::parse_from_str(&compact, "%Y-%m-%dT%H:%M:%S%z").is_ok()
}

/// A relation type must be `namespace:code`; when `allowed` is given the
/// pair must be listed there
pub fn validate_relator<S: AsRef<str>>(rel_type: &str, allowed: Option<&[S]>) -> bool {
    let Some((namespace, code)) = rel_type.split_once(':') else {
        return false;
    };
    if namespace.trim().is_empty() || code.trim().is_empty() {
        return false;
    }
    match allowed {
        Some(list) => list.iter().any(|relator| relator.as_ref() == rel_type),
        None => true,
    }
}
