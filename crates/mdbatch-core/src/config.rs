//! Batch configuration
//!
//! One explicit, validated structure built once per run (usually from YAML)
//! and passed by reference to every component. Every field has a documented
//! default so an empty file is a valid configuration.

use crate::error::{CoreError, Result};
use crate::language::SUPPORTED_LANGUAGE_CODES;
use crate::normalize::{NormalizationPolicy, NormalizationStep};
use crate::version;
use mdbatch_common::types::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SUBDELIMITER: &str = "|";
pub const DEFAULT_DB_FILENAME: &str = "mdbatch.db";
pub const DEFAULT_PAGE_TITLE_TEMPLATE: &str = "$parent_title, page $weight";
pub const DEFAULT_ID_FIELD: &str = "id";
pub const DEFAULT_PARENT_ID_FIELD: &str = "parent_id";
pub const DEFAULT_FILE_FIELD: &str = "file";
pub const DEFAULT_CHECKSUM_FIELD: &str = "checksum";
pub const DEFAULT_TITLE_FIELD: &str = "title";

/// Micro-format carried by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain text, split on the subdelimiter
    Text,
    Geolocation,
    Link,
    AuthorityLink,
    TypedRelation,
    MediaTrack,
    /// EDTF date values
    Edtf,
    /// Creation timestamp with an explicit UTC offset
    CreatedDate,
    /// Language code
    Language,
}

/// How one column is parsed and validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,

    /// Entity type the relation points at (typed relations only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            target_type: None,
        }
    }

    pub fn typed_relation(target_type: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::TypedRelation,
            target_type: Some(target_type.into()),
        }
    }
}

/// Batch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Separator packing several values into one cell
    pub subdelimiter: String,

    /// Normalization steps to skip
    pub clean_csv_values_skip: Vec<NormalizationStep>,

    /// Sources allowed in authority link values
    pub authority_sources: Vec<String>,

    /// Overrides the built-in supported language list
    pub language_codes: Option<Vec<String>>,

    /// Relator codes (`namespace:code`) allowed in typed relations; any
    /// namespaced code is accepted when unset
    pub allowed_relators: Option<Vec<String>>,

    /// Working area holding the local state store
    pub temp_dir: PathBuf,

    /// Store file name inside `temp_dir`
    pub sqlite_db_filename: String,

    /// Title for generated child pages; `$parent_title` and `$weight` are substituted
    pub page_title_template: String,

    /// Column holding each row's local identifier
    pub id_field: String,

    /// Column naming the parent row's local identifier
    pub parent_id_field: String,

    /// Column holding a media file path or URL
    pub file_field: String,

    /// Column holding the row title; empty child titles come from `page_title_template`
    pub title_field: String,

    /// Base directory for relative media file paths
    pub input_dir: PathBuf,

    /// Column name -> micro-format
    pub fields: BTreeMap<String, FieldSpec>,

    /// Values added to every row unless the row already has the field
    pub csv_field_templates: Vec<BTreeMap<String, String>>,

    /// Media type -> file extensions, consulted before the built-in table
    pub media_types: BTreeMap<String, Vec<String>>,

    /// Forces one media type for every file
    pub media_type: Option<String>,

    /// Fixity algorithm for media files, none when unset
    pub fixity_algorithm: Option<ChecksumAlgorithm>,

    /// Column holding an expected media checksum, verified when
    /// `fixity_algorithm` is set
    pub checksum_field: String,

    /// Lowest host version the prepared data may target
    pub minimum_host_version: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subdelimiter: DEFAULT_SUBDELIMITER.to_string(),
            clean_csv_values_skip: Vec::new(),
            authority_sources: Vec::new(),
            language_codes: None,
            allowed_relators: None,
            temp_dir: std::env::temp_dir(),
            sqlite_db_filename: DEFAULT_DB_FILENAME.to_string(),
            page_title_template: DEFAULT_PAGE_TITLE_TEMPLATE.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            parent_id_field: DEFAULT_PARENT_ID_FIELD.to_string(),
            file_field: DEFAULT_FILE_FIELD.to_string(),
            title_field: DEFAULT_TITLE_FIELD.to_string(),
            input_dir: PathBuf::from("."),
            fields: BTreeMap::new(),
            csv_field_templates: Vec::new(),
            media_types: BTreeMap::new(),
            media_type: None,
            fixity_algorithm: None,
            checksum_field: DEFAULT_CHECKSUM_FIELD.to_string(),
            minimum_host_version: None,
        }
    }
}

impl Config {
    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::config(format!(
                "configuration file '{}' does not exist",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `MDBATCH_TEMP_DIR` and `MDBATCH_DB_FILENAME` overrides
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var("MDBATCH_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }
        if let Ok(name) = std::env::var("MDBATCH_DB_FILENAME") {
            self.sqlite_db_filename = name;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every setting; the first problem found is returned
    pub fn validate(&self) -> Result<()> {
        if self.subdelimiter.is_empty() {
            return Err(CoreError::config("subdelimiter must not be empty"));
        }

        if self.sqlite_db_filename.trim().is_empty()
            || self.sqlite_db_filename.contains(['/', '\\'])
        {
            return Err(CoreError::config(format!(
                "sqlite_db_filename '{}' must be a bare file name",
                self.sqlite_db_filename
            )));
        }

        if self.id_field.trim().is_empty() {
            return Err(CoreError::config("id_field must not be empty"));
        }
        if self.parent_id_field == self.id_field {
            return Err(CoreError::config("parent_id_field must differ from id_field"));
        }

        if let Some(codes) = &self.language_codes {
            if codes.is_empty() {
                return Err(CoreError::config("language_codes must not be an empty list"));
            }
        }

        for (name, spec) in &self.fields {
            match spec.kind {
                FieldKind::TypedRelation if spec.target_type.is_none() => {
                    return Err(CoreError::config(format!(
                        "typed relation field '{name}' needs a target_type"
                    )));
                },
                FieldKind::AuthorityLink if self.authority_sources.is_empty() => {
                    return Err(CoreError::config(format!(
                        "authority link field '{name}' requires authority_sources"
                    )));
                },
                _ => {},
            }
        }

        for template in &self.csv_field_templates {
            if template.keys().any(|name| name.trim().is_empty()) {
                return Err(CoreError::config("csv_field_templates contain an empty field name"));
            }
        }

        if let Some(minimum) = &self.minimum_host_version {
            version::parse_version(minimum).map_err(|e| {
                CoreError::config(format!("minimum_host_version is not usable: {e}"))
            })?;
        }

        Ok(())
    }

    /// Path of this run's local state store
    pub fn store_path(&self) -> PathBuf {
        self.temp_dir.join(&self.sqlite_db_filename)
    }

    pub fn normalization_policy(&self) -> NormalizationPolicy {
        NormalizationPolicy::from_skip(&self.clean_csv_values_skip)
    }

    /// Language codes accepted by language and media track validation
    pub fn language_codes(&self) -> Vec<&str> {
        match &self.language_codes {
            Some(codes) => codes.iter().map(String::as_str).collect(),
            None => SUPPORTED_LANGUAGE_CODES.to_vec(),
        }
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Whether a host reporting `host_version` meets `minimum_host_version`
    pub fn host_version_supported(&self, host_version: &str) -> Result<bool> {
        let Some(minimum) = &self.minimum_host_version else {
            return Ok(true);
        };
        Ok(version::parse_version(host_version)? >= version::parse_version(minimum)?)
    }
}
