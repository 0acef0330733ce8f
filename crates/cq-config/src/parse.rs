//! Configuration file parsing.
//!
//! Parses individual `.cq.toml` files into intermediate `RawConfig` structures that preserve the
//! optional nature of all fields before merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::{BucketOrder, BucketType, ConfigError, FieldType, GroupQuery};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Engine settings section.
    pub engine: Option<RawEngineSettings>,
    /// Logical to physical field name overrides.
    pub field_mapper: Option<BTreeMap<String, RawFieldMapping>>,
    /// Default-scope relevance settings.
    pub relevance: Option<RawRelevance>,
    /// Container definitions: name -> container config.
    pub container: Option<BTreeMap<String, RawContainer>>,
}

/// Raw engine settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEngineSettings {
    /// Version of the search server requests are compiled for.
    pub server_version: Option<String>,
}

/// A field mapper override: either a bare physical path or a path with its nested path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawFieldMapping {
    /// Physical path only.
    Path(String),
    /// Physical path and nested document path.
    Detailed {
        /// Physical field path.
        path: String,
        /// Nested document path.
        nested_path: Option<String>,
    },
}

/// Phrase boost setting: `false` disables the phrase clause, an integer sets its boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawPhraseBoost {
    /// Explicit boost.
    Boost(u32),
    /// Toggle; only `false` is meaningful.
    Toggle(bool),
}

/// Raw relevance settings, shared by the default and container scopes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRelevance {
    /// Phrase clause boost.
    pub phrase_match_boost: Option<RawPhraseBoost>,
    /// Common-terms cutoff frequency.
    pub cutoff_frequency: Option<f64>,
    /// Minimum should match of the exact branch.
    pub minimum_should_match: Option<String>,
    /// Multi-field tie breaker.
    pub tie_breaker: Option<f32>,
    /// Fuzzy matching section.
    pub fuzziness: Option<RawFuzziness>,
    /// Phonetic matching section.
    pub phonetic: Option<RawPhonetic>,
    /// Branch boost decay per recursion level.
    pub fuzzy_boost_decay: Option<f64>,
    /// Maximum recursion depth.
    pub max_depth: Option<usize>,
}

/// Raw fuzziness settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFuzziness {
    /// Whether fuzzy branches are generated.
    pub enabled: Option<bool>,
    /// Edit distance.
    pub value: Option<String>,
    /// Exact prefix length.
    pub prefix_length: Option<u32>,
    /// Maximum term expansions.
    pub max_expansions: Option<u32>,
    /// Minimum should match of fuzzy branches.
    pub minimum_should_match: Option<String>,
}

/// Raw phonetic settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPhonetic {
    /// Whether phonetic branches are generated.
    pub enabled: Option<bool>,
}

/// Raw container definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContainer {
    /// Index name (defaults to the container name).
    pub index: Option<String>,
    /// Document type name.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Default full-text field.
    pub search_field: Option<String>,
    /// Spellcheck field.
    pub spelling_field: Option<String>,
    /// Default collapse field.
    pub collapse: Option<String>,
    /// Container-scope relevance settings.
    pub relevance: Option<RawRelevance>,
    /// Field definitions: physical path -> definition.
    pub field: Option<BTreeMap<String, RawField>>,
    /// Configured aggregation buckets.
    pub aggregation: Option<Vec<RawBucket>>,
}

/// Raw field definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawField {
    /// Field type (defaults to text).
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    /// Relevance weight.
    pub weight: Option<f64>,
    /// Whether the field is searchable (defaults to true for text fields).
    pub searchable: Option<bool>,
    /// Whether the field is filterable.
    pub filterable: Option<bool>,
    /// Whether the field feeds spellchecking.
    pub spellcheck: Option<bool>,
    /// Nested document path.
    pub nested_path: Option<String>,
    /// Minimum facet coverage rate in percent.
    pub facet_min_coverage_rate: Option<f64>,
}

/// Raw aggregation bucket.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct RawBucket {
    /// Bucket name.
    pub name: String,
    /// Bucket kind.
    #[serde(rename = "type")]
    pub kind: BucketType,
    /// Aggregated logical field.
    pub field: Option<String>,
    /// Maximum bucket count; `0` means unbounded.
    pub size: Option<u32>,
    /// Term bucket ordering.
    pub order: Option<BucketOrder>,
    /// Minimum document count.
    pub min_doc_count: Option<u64>,
    /// Histogram interval.
    pub interval: Option<f64>,
    /// Named sub-queries of a query group; a single table or an array of tables.
    #[serde(default, rename = "query")]
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub queries: Option<Vec<GroupQuery>>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
