//! Row checking and preparation
//!
//! [`RowChecker`] takes raw rows in input order and turns each into a
//! [`PreparedRow`]: normalized, templated, parsed per configured field,
//! deduplicated and fingerprinted. It carries the ids seen so far so that a
//! child naming a parent that has not appeared yet (and is not in the store
//! from an earlier run) is caught before anything leaves the process.
//!
//! In [`TaskMode::Check`] every issue of every row is collected into a
//! [`CheckReport`]. In [`TaskMode::Execute`] the first issue ends the run.

use crate::config::{Config, FieldKind, FieldSpec};
use crate::dedupe::deduplicate;
use crate::error::{CoreError, Result};
use crate::fingerprint::{fingerprint_row, Fingerprint};
use crate::media::{media_type_for, MediaType};
use crate::normalize::Normalizer;
use crate::parsers::{self, FormatError, RelationTarget};
use crate::row::{FieldValue, Row};
use crate::store::Repository;
use crate::text::page_title_from_template;
use crate::validators;
use mdbatch_common::checksum::{compute_file_checksum, verify_file_checksum};
use mdbatch_common::types::ChecksumAlgorithm;
use mdbatch_common::CommonError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    /// Dry run: collect every issue and keep going
    Check,
    /// Real run: the first issue is an error
    Execute,
}

/// One problem found in one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckIssue {
    pub row: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl From<&CoreError> for CheckIssue {
    fn from(err: &CoreError) -> Self {
        let (row, field, value) = match err {
            CoreError::MalformedValue {
                row, field, value, ..
            } => (row.clone(), Some(field.clone()), Some(value.clone())),
            CoreError::Semantic { row, .. } => (row.clone(), None, None),
            CoreError::OrderingViolation { child, .. } => (child.clone(), None, None),
            _ => (String::new(), None, None),
        };
        Self {
            row,
            field,
            value,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub rows_checked: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A row ready to hand to the remote client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRow {
    pub local_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Remote id of the parent when an earlier run created it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_remote_id: Option<String>,
    /// Normalized cells, templates applied
    pub row: Row,
    /// Parsed values of the configured fields, duplicates removed
    pub fields: BTreeMap<String, Vec<FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub fingerprint: Fingerprint,
    /// Same fingerprint as the one cached for this id
    pub unchanged: bool,
}

pub enum RowOutcome {
    Prepared(Box<PreparedRow>),
    Invalid(Vec<CoreError>),
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub report: CheckReport,
    pub prepared: Vec<PreparedRow>,
}

struct ParentInfo {
    title: String,
    children: usize,
}

pub struct RowChecker<'a> {
    config: &'a Config,
    normalizer: Normalizer,
    languages: Vec<&'a str>,
    seen_ids: HashSet<String>,
    parents: HashMap<String, ParentInfo>,
    position: usize,
}

impl<'a> RowChecker<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            normalizer: Normalizer::from_config(config),
            languages: config.language_codes(),
            seen_ids: HashSet::new(),
            parents: HashMap::new(),
            position: 0,
        }
    }

    /// Check every row in order
    ///
    /// Store failures are returned as errors in both modes. In execute mode
    /// the first row issue is returned as an error too.
    pub fn run<I>(
        &mut self,
        rows: I,
        mode: TaskMode,
        repo: Option<&Repository>,
    ) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut outcome = BatchOutcome::default();
        for row in rows {
            outcome.report.rows_checked += 1;
            match self.check_row(&row, repo)? {
                RowOutcome::Prepared(prepared) => outcome.prepared.push(*prepared),
                RowOutcome::Invalid(errors) => {
                    if mode == TaskMode::Execute {
                        if let Some(first) = errors.into_iter().next() {
                            warn!(error = %first, "stopping before any row is handed on");
                            return Err(first);
                        }
                        continue;
                    }
                    for err in &errors {
                        warn!(error = %err, "row issue");
                        outcome.report.issues.push(CheckIssue::from(err));
                    }
                },
            }
        }

        info!(
            rows = outcome.report.rows_checked,
            issues = outcome.report.issues.len(),
            prepared = outcome.prepared.len(),
            "checked input rows"
        );
        Ok(outcome)
    }

    /// Check and prepare one row
    pub fn check_row(&mut self, raw: &Row, repo: Option<&Repository>) -> Result<RowOutcome> {
        self.position += 1;
        let config = self.config;

        let mut row = self.normalizer.normalize_row(raw);
        apply_field_templates(&mut row, &config.csv_field_templates);

        let local_id = row.get(&config.id_field).unwrap_or_default().to_string();
        let label = if local_id.is_empty() {
            format!("row {}", self.position)
        } else {
            local_id.clone()
        };
        let mut errors = Vec::new();

        if local_id.is_empty() {
            errors.push(CoreError::semantic(
                &label,
                format!("has no value in the \"{}\" column", config.id_field),
            ));
        } else if self.seen_ids.contains(&local_id) {
            errors.push(CoreError::semantic(
                &label,
                format!("id \"{local_id}\" appears more than once in the input"),
            ));
        }

        let parent_id = row
            .get(&config.parent_id_field)
            .filter(|parent| !parent.is_empty())
            .map(str::to_string);
        let mut parent_remote_id = None;
        if let Some(parent) = &parent_id {
            parent_remote_id = match repo {
                Some(repo) => repo.remote_id_for(parent)?,
                None => None,
            };
            if !self.seen_ids.contains(parent) && parent_remote_id.is_none() {
                errors.push(CoreError::OrderingViolation {
                    child: label.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.fill_child_title(&mut row, parent_id.as_deref());

        if !local_id.is_empty() {
            self.seen_ids.insert(local_id.clone());
            self.parents.insert(
                local_id.clone(),
                ParentInfo {
                    title: row.get(&config.title_field).unwrap_or_default().to_string(),
                    children: 0,
                },
            );
        }

        let mut fields = BTreeMap::new();
        for (name, spec) in &config.fields {
            let Some(value) = row.get(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            match self.parse_field(&label, name, spec, value) {
                Ok(values) => {
                    fields.insert(name.clone(), deduplicate(&values));
                },
                Err(field_errors) => errors.extend(field_errors),
            }
        }

        let file = row.get(&config.file_field).filter(|f| !f.is_empty());
        let (media_type, checksum) = match file {
            Some(file) => {
                let expected = row.get(&config.checksum_field).map(str::trim);
                self.inspect_file(&label, file, expected, &mut errors)?
            },
            None => (None, None),
        };

        if !errors.is_empty() {
            debug!(row = %label, issues = errors.len(), "row has issues");
            return Ok(RowOutcome::Invalid(errors));
        }

        let fingerprint = fingerprint_row(&row);
        let unchanged = match repo {
            Some(repo) => repo.is_unchanged(&local_id, &fingerprint)?,
            None => false,
        };
        debug!(row = %label, %fingerprint, unchanged, "row prepared");

        Ok(RowOutcome::Prepared(Box::new(PreparedRow {
            local_id,
            parent_id,
            parent_remote_id,
            row,
            fields,
            media_type,
            checksum,
            fingerprint,
            unchanged,
        })))
    }

    /// Children with an empty title get one from the page title template
    fn fill_child_title(&mut self, row: &mut Row, parent_id: Option<&str>) {
        let Some(parent) = parent_id.and_then(|id| self.parents.get_mut(id)) else {
            return;
        };
        parent.children += 1;
        let title_field = &self.config.title_field;
        if row.get(title_field).is_some_and(|t| !t.is_empty()) {
            return;
        }
        let title = page_title_from_template(
            &self.config.page_title_template,
            &parent.title,
            parent.children,
        );
        row.insert(title_field.clone(), title);
    }

    fn parse_field(
        &self,
        label: &str,
        name: &str,
        spec: &FieldSpec,
        value: &str,
    ) -> std::result::Result<Vec<FieldValue>, Vec<CoreError>> {
        let config = self.config;
        let sub = config.subdelimiter.as_str();
        let malformed = |e: FormatError| vec![CoreError::malformed(label, name, e.value, e.reason)];
        let violation = |group: &str, reason: &str| {
            CoreError::semantic(label, format!("field \"{name}\": value \"{group}\" {reason}"))
        };
        let mut errors = Vec::new();

        let values: Vec<FieldValue> = match spec.kind {
            FieldKind::Text => parsers::split_groups(value, sub).map(FieldValue::from).collect(),
            FieldKind::Geolocation => {
                let points = parsers::split_geolocation(value, sub).map_err(malformed)?;
                for point in &points {
                    let pair = format!("{},{}", point.lat, point.lng);
                    if !validators::validate_latlong(&pair) {
                        errors.push(violation(&pair, "is not a valid latitude,longitude pair"));
                    }
                }
                points.into_iter().map(FieldValue::from).collect()
            },
            FieldKind::Link => {
                let links = parsers::split_link(value, sub).map_err(malformed)?;
                for link in &links {
                    if !validators::validate_link(&link.uri) {
                        errors.push(violation(&link.uri, "is not an http or https link"));
                    }
                }
                links.into_iter().map(FieldValue::from).collect()
            },
            FieldKind::AuthorityLink => {
                let links = parsers::split_authority_link(value, sub).map_err(malformed)?;
                for group in parsers::split_groups(value, sub) {
                    if !validators::validate_authority_link(group, &config.authority_sources) {
                        errors.push(violation(
                            group,
                            "needs an allowed authority source and an http or https link",
                        ));
                    }
                }
                links.into_iter().map(FieldValue::from).collect()
            },
            FieldKind::TypedRelation => {
                let target_type = spec.target_type.as_deref().unwrap_or_default();
                let relations =
                    parsers::split_typed_relation(value, sub, target_type).map_err(malformed)?;
                for relation in &relations {
                    self.check_relation(relation, &violation, &mut errors);
                }
                relations.into_iter().map(FieldValue::from).collect()
            },
            FieldKind::MediaTrack => {
                let tracks = parsers::split_media_track(value, sub).map_err(malformed)?;
                for group in parsers::split_groups(value, sub) {
                    if !validators::validate_media_track(group, &self.languages) {
                        errors.push(violation(
                            group,
                            "is not a valid media track \
                             (label:subtitles|captions:language:file.vtt)",
                        ));
                    }
                }
                tracks.into_iter().map(FieldValue::from).collect()
            },
            FieldKind::Edtf => self.check_groups(
                value,
                validators::validate_edtf,
                "is not a valid EDTF date",
                &violation,
                &mut errors,
            ),
            FieldKind::Language => self.check_groups(
                value,
                |code| validators::validate_language_code(code, &self.languages),
                "is not a supported language code",
                &violation,
                &mut errors,
            ),
            FieldKind::CreatedDate => {
                if !validators::validate_created_date(value) {
                    errors.push(violation(
                        value,
                        "is not a timestamp like 2020-11-15T23:49:22+00:00",
                    ));
                }
                vec![FieldValue::from(value)]
            },
        };

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }

    fn check_groups(
        &self,
        value: &str,
        valid: impl Fn(&str) -> bool,
        reason: &str,
        violation: &impl Fn(&str, &str) -> CoreError,
        errors: &mut Vec<CoreError>,
    ) -> Vec<FieldValue> {
        parsers::split_groups(value, &self.config.subdelimiter)
            .inspect(|group| {
                if !valid(group) {
                    errors.push(violation(group, reason));
                }
            })
            .map(FieldValue::from)
            .collect()
    }

    fn check_relation(
        &self,
        relation: &parsers::TypedRelation,
        violation: &impl Fn(&str, &str) -> CoreError,
        errors: &mut Vec<CoreError>,
    ) {
        if !validators::validate_relator::<String>(&relation.rel_type, None) {
            errors.push(violation(
                &relation.rel_type,
                "has no namespace; typed relation fields require a vocabulary namespace",
            ));
        } else if !validators::validate_relator(
            &relation.rel_type,
            self.config.allowed_relators.as_deref(),
        ) {
            errors.push(violation(&relation.rel_type, "is not an allowed relator"));
        }

        if let RelationTarget::Text(target) = &relation.target_id {
            let looks_like_uri = target.starts_with("http:")
                || target.starts_with("https:")
                || target.contains("://");
            if looks_like_uri && !validators::validate_link(target) {
                errors.push(violation(target, "is not a valid http or https URI"));
            }
        }
    }

    /// Media type and, for local files, existence and fixity
    fn inspect_file(
        &self,
        label: &str,
        file: &str,
        expected: Option<&str>,
        errors: &mut Vec<CoreError>,
    ) -> Result<(Option<MediaType>, Option<String>)> {
        let media_type = media_type_for(file, self.config);
        if file.starts_with("http://") || file.starts_with("https://") {
            return Ok((Some(media_type), None));
        }

        let path = if Path::new(file).is_absolute() {
            Path::new(file).to_path_buf()
        } else {
            self.config.input_dir.join(file)
        };
        if !path.is_file() {
            errors.push(CoreError::semantic(
                label,
                format!(
                    "file \"{}\" in the \"{}\" column does not exist",
                    path.display(),
                    self.config.file_field
                ),
            ));
            return Ok((Some(media_type), None));
        }

        let Some(algorithm) = self.config.fixity_algorithm else {
            return Ok((Some(media_type), None));
        };
        let checksum = match expected.filter(|e| !e.is_empty()) {
            Some(expected) => self.verify_fixity(label, &path, expected, algorithm, errors)?,
            None => Some(compute_file_checksum(&path, algorithm)?),
        };
        Ok((Some(media_type), checksum))
    }

    /// Compare a file against the checksum given in the row
    fn verify_fixity(
        &self,
        label: &str,
        path: &Path,
        expected: &str,
        algorithm: ChecksumAlgorithm,
        errors: &mut Vec<CoreError>,
    ) -> Result<Option<String>> {
        let well_formed = expected.len() == algorithm.hex_len()
            && expected.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed {
            errors.push(CoreError::malformed(
                label,
                &self.config.checksum_field,
                expected,
                format!("is not a {algorithm} checksum"),
            ));
            return Ok(None);
        }
        match verify_file_checksum(path, expected, algorithm) {
            Ok(()) => Ok(Some(expected.to_ascii_lowercase())),
            Err(CommonError::ChecksumMismatch { actual, .. }) => {
                errors.push(CoreError::semantic(
                    label,
                    format!(
                        "file \"{}\" has {algorithm} checksum {actual}, not {expected}",
                        path.display()
                    ),
                ));
                Ok(None)
            },
            Err(other) => Err(other.into()),
        }
    }
}

/// Add template values for fields the row does not already have
pub fn apply_field_templates(row: &mut Row, templates: &[BTreeMap<String, String>]) {
    for template in templates {
        for (name, value) in template {
            if !row.contains(name) {
                row.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> Row {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_templates_never_override() {
        let mut r = row(&[("id", "1"), ("field_model", "Image")]);
        let template: BTreeMap<String, String> = [
            ("field_model".to_string(), "Collection".to_string()),
            ("field_rights".to_string(), "CC0".to_string()),
        ]
        .into_iter()
        .collect();
        apply_field_templates(&mut r, &[template]);
        assert_eq!(r.get("field_model"), Some("Image"));
        assert_eq!(r.get("field_rights"), Some("CC0"));
    }

    #[test]
    fn test_parent_must_come_first() {
        let config = Config::default();
        let rows = vec![
            row(&[("id", "p1"), ("parent_id", "")]),
            row(&[("id", "c1p1"), ("parent_id", "p1")]),
            row(&[("id", "c2p2"), ("parent_id", "p2")]),
            row(&[("id", "p2"), ("parent_id", "")]),
        ];

        let outcome = RowChecker::new(&config).run(rows.clone(), TaskMode::Check, None).unwrap();
        assert_eq!(outcome.report.rows_checked, 4);
        assert_eq!(outcome.report.issues.len(), 1);
        assert!(outcome.report.issues[0].message.contains("\"c2p2\" must come after"));

        let err = RowChecker::new(&config).run(rows, TaskMode::Execute, None).unwrap_err();
        assert!(matches!(err, CoreError::OrderingViolation { ref child, .. } if child == "c2p2"));
    }

    #[test]
    fn test_parent_from_earlier_run() {
        let config = Config::default();
        let mut repo = Repository::open_in_memory().unwrap();
        repo.record_remote_id("p2", "77", None).unwrap();

        let outcome = RowChecker::new(&config)
            .run(vec![row(&[("id", "c2p2"), ("parent_id", "p2")])], TaskMode::Execute, Some(&repo))
            .unwrap();
        assert_eq!(outcome.prepared[0].parent_remote_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_duplicate_and_missing_ids() {
        let config = Config::default();
        let rows = vec![row(&[("id", "1")]), row(&[("id", "1")]), row(&[("id", " ")])];
        let outcome = RowChecker::new(&config).run(rows, TaskMode::Check, None).unwrap();
        assert_eq!(outcome.report.issues.len(), 2);
        assert!(outcome.report.issues[0].message.contains("more than once"));
        assert_eq!(outcome.report.issues[1].row, "row 3");
    }

    #[test]
    fn test_child_titles_from_template() {
        let config = Config::default();
        let rows = vec![
            row(&[("id", "book"), ("title", "Test parent title"), ("parent_id", "")]),
            row(&[("id", "p1"), ("title", ""), ("parent_id", "book")]),
            row(&[("id", "p2"), ("title", ""), ("parent_id", "book")]),
            row(&[("id", "p3"), ("title", "Plates"), ("parent_id", "book")]),
        ];
        let outcome = RowChecker::new(&config).run(rows, TaskMode::Execute, None).unwrap();
        assert_eq!(outcome.prepared[1].row.get("title"), Some("Test parent title, page 1"));
        assert_eq!(outcome.prepared[2].row.get("title"), Some("Test parent title, page 2"));
        assert_eq!(outcome.prepared[3].row.get("title"), Some("Plates"));
    }
}
