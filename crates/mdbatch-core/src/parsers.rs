//! Micro-format parsers
//!
//! Each parser splits a cell on the subdelimiter and decodes every non-blank
//! group into a typed value. Blank cells give an empty `Vec`; a group that
//! does not have the required shape is a [`FormatError`].

use crate::row::FieldValue;
use serde::Serialize;
use thiserror::Error;

/// Separator between the parts of link and authority link values
pub const LINK_PART_SEPARATOR: &str = "%%";

/// A group that could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value \"{value}\" {reason}")]
pub struct FormatError {
    pub value: String,
    pub reason: String,
}

impl FormatError {
    fn new(value: &str, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ParseResult<T> = std::result::Result<Vec<T>, FormatError>;

/// Non-blank, trimmed groups of a cell
pub fn split_groups<'a>(cell: &'a str, subdelimiter: &'a str) -> impl Iterator<Item = &'a str> {
    cell.split(subdelimiter).map(str::trim).filter(|group| !group.is_empty())
}

// ============================================================================
// Geolocation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Geolocation {
    pub lat: String,
    pub lng: String,
}

/// Parse `lat,lng` groups
///
/// One leading backslash in front of a sign (`\+`, `\-`) is dropped from each
/// coordinate. No other escapes are recognised.
pub fn split_geolocation(cell: &str, subdelimiter: &str) -> ParseResult<Geolocation> {
    split_groups(cell, subdelimiter)
        .map(|group| {
            let (lat, lng) = group
                .split_once(',')
                .ok_or_else(|| FormatError::new(group, "is not a \"lat,lng\" pair"))?;
            Ok(Geolocation {
                lat: unescape_sign(lat.trim()).to_string(),
                lng: unescape_sign(lng.trim()).to_string(),
            })
        })
        .collect()
}

fn unescape_sign(coordinate: &str) -> &str {
    match coordinate.strip_prefix('\\') {
        Some(rest) if rest.starts_with(['+', '-']) => rest,
        _ => coordinate,
    }
}

impl From<Geolocation> for FieldValue {
    fn from(value: Geolocation) -> Self {
        FieldValue::composite([("lat", value.lat.into()), ("lng", value.lng.into())])
    }
}

// ============================================================================
// Link
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub uri: String,
    pub title: String,
}

/// Parse `uri` or `uri%%title` groups; the title defaults to the uri
pub fn split_link(cell: &str, subdelimiter: &str) -> ParseResult<Link> {
    Ok(split_groups(cell, subdelimiter)
        .map(|group| match group.split_once(LINK_PART_SEPARATOR) {
            Some((uri, title)) => Link {
                uri: uri.trim().to_string(),
                title: title.trim().to_string(),
            },
            None => Link {
                uri: group.to_string(),
                title: group.to_string(),
            },
        })
        .collect())
}

impl From<Link> for FieldValue {
    fn from(value: Link) -> Self {
        FieldValue::composite([("uri", value.uri.into()), ("title", value.title.into())])
    }
}

// ============================================================================
// Authority link
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityLink {
    pub source: String,
    pub uri: String,
    pub title: String,
}

/// Parse `source%%uri` or `source%%uri%%title` groups; the title defaults to ""
pub fn split_authority_link(cell: &str, subdelimiter: &str) -> ParseResult<AuthorityLink> {
    split_groups(cell, subdelimiter)
        .map(|group| {
            let mut parts = group.splitn(3, LINK_PART_SEPARATOR).map(str::trim);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(source), Some(uri), title) => Ok(AuthorityLink {
                    source: source.to_string(),
                    uri: uri.to_string(),
                    title: title.unwrap_or_default().to_string(),
                }),
                _ => Err(FormatError::new(group, "is not a \"source%%uri[%%title]\" value")),
            }
        })
        .collect()
}

impl From<AuthorityLink> for FieldValue {
    fn from(value: AuthorityLink) -> Self {
        FieldValue::composite([
            ("source", value.source.into()),
            ("uri", value.uri.into()),
            ("title", value.title.into()),
        ])
    }
}

// ============================================================================
// Typed relation
// ============================================================================

/// What a typed relation points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelationTarget {
    /// Numeric id of an existing entity
    Id(i64),
    /// URI or free text, kept verbatim
    Text(String),
}

impl RelationTarget {
    fn parse(target: &str) -> Self {
        if !target.is_empty() && target.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = target.parse() {
                return RelationTarget::Id(id);
            }
        }
        RelationTarget::Text(target.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedRelation {
    pub target_id: RelationTarget,
    /// `namespace:code`
    pub rel_type: String,
    pub target_type: String,
}

/// Parse `namespace:code:target` groups
///
/// Only the first two colons separate parts; the target keeps any further
/// colons.
pub fn split_typed_relation(
    cell: &str,
    subdelimiter: &str,
    target_type: &str,
) -> ParseResult<TypedRelation> {
    split_groups(cell, subdelimiter)
        .map(|group| {
            let mut parts = group.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(namespace), Some(code), Some(target)) => Ok(TypedRelation {
                    target_id: RelationTarget::parse(target.trim()),
                    rel_type: format!("{namespace}:{code}"),
                    target_type: target_type.to_string(),
                }),
                _ => Err(FormatError::new(
                    group,
                    "does not use the pattern required for typed relation fields",
                )),
            }
        })
        .collect()
}

impl From<TypedRelation> for FieldValue {
    fn from(value: TypedRelation) -> Self {
        let target = match value.target_id {
            RelationTarget::Id(id) => FieldValue::Integer(id),
            RelationTarget::Text(text) => FieldValue::Text(text),
        };
        FieldValue::composite([
            ("target_id", target),
            ("rel_type", value.rel_type.into()),
            ("target_type", value.target_type.into()),
        ])
    }
}

// ============================================================================
// Media track
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaTrack {
    pub label: String,
    pub kind: String,
    pub srclang: String,
    /// Everything after the third colon, verbatim
    pub file_path: String,
}

/// Parse `label:kind:srclang:file_path` groups
pub fn split_media_track(cell: &str, subdelimiter: &str) -> ParseResult<MediaTrack> {
    split_groups(cell, subdelimiter).map(parse_media_track).collect()
}

/// Parse a single media track group
pub fn parse_media_track(group: &str) -> std::result::Result<MediaTrack, FormatError> {
    let mut parts = group.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(label), Some(kind), Some(srclang), Some(file_path)) => Ok(MediaTrack {
            label: label.to_string(),
            kind: kind.to_string(),
            srclang: srclang.to_string(),
            file_path: file_path.to_string(),
        }),
        _ => Err(FormatError::new(group, "is not a \"label:kind:srclang:file_path\" value")),
    }
}

impl From<MediaTrack> for FieldValue {
    fn from(value: MediaTrack) -> Self {
        FieldValue::composite([
            ("label", value.label.into()),
            ("kind", value.kind.into()),
            ("srclang", value.srclang.into()),
            ("file_path", value.file_path.into()),
        ])
    }
}
