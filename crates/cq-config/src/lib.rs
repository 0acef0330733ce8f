//! Configuration system for cq.
//!
//! cq uses TOML configuration files named `.cq.toml`. Configuration is resolved by walking up
//! the directory tree from the current working directory, collecting any `.cq.toml` files found,
//! then loading `~/.cq.toml` as the global config with lowest precedence.
//!
//! Inside the files, relevance settings have two scopes: `[relevance]` applies to every
//! container and `[container.<name>.relevance]` overrides it for one container. The merged
//! result is checked once at load time; compilations then read immutable snapshots through a
//! [`ConfigStore`].

#![warn(missing_docs)]

mod bucket;
mod discovery;
mod error;
mod field_mapping;
mod mapping;
mod merge;
mod parse;
mod relevance;
mod store;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use bucket::{BucketConfig, BucketOrder, BucketType, DEFAULT_BUCKET_SIZE, GroupQuery};
pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use field_mapping::{DEFAULT_FIELD_MAPPINGS, FieldMapping, resolve_field_mappings};
pub use mapping::{
    Analyzer, DEFAULT_SEARCH_FIELD, DEFAULT_SPELLING_FIELD, FieldDefinition, FieldType, Mapping,
};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, parse_config_file, parse_config_str};
pub use relevance::{
    DEFAULT_FUZZY_BOOST_DECAY, DEFAULT_MAX_DEPTH, FuzzinessConfig, MAX_DEPTH_LIMIT,
    PhoneticConfig, RelevanceConfig,
};
use serde::{Deserialize, Serialize};
pub use store::ConfigStore;
pub use templates::config_template;
use toml::ser;
pub use validate::ConfigWarning;
use validate::{check_config, validate_config};

/// Server version assumed when none is configured.
pub const DEFAULT_SERVER_VERSION: &str = "7.10.2";

/// Top-level merged configuration for cq.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Engine settings.
    pub engine: EngineSettings,
    /// Field mapper overrides keyed by logical name (built-in defaults not included).
    pub field_mapper: BTreeMap<String, FieldMapping>,
    /// Default-scope relevance settings, used by containers without their own.
    pub relevance: RelevanceConfig,
    /// Containers keyed by name, with scoped settings resolved.
    pub containers: BTreeMap<String, ContainerConfig>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.cq.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first. The merged
    /// configuration is checked before it is returned, so invalid settings fail here rather
    /// than during compilation.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let config = merge_configs(&parsed)?;
        check_config(&config)?;
        Ok(config)
    }

    /// Looks up a container by name.
    pub fn container(&self, name: &str) -> Option<&ContainerConfig> {
        self.containers.get(name)
    }

    /// Returns the built-in field mappings with the configured overrides applied.
    pub fn field_mappings(&self) -> BTreeMap<String, FieldMapping> {
        resolve_field_mappings(&self.field_mapper)
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - Empty configuration (no containers defined)
    /// - Containers without searchable fields
    /// - Fuzzy or phonetic matching without spellcheck fields
    /// - Buckets on fields the mapping does not declare
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective configuration to TOML format.
    pub fn settings_to_toml(&self) -> Result<String, ser::Error> {
        let serializable = SerializableConfig {
            engine: &self.engine,
            field_mapper: &self.field_mapper,
            relevance: &self.relevance,
            container: &self.containers,
        };
        toml::to_string_pretty(&serializable)
    }
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Version of the search server requests are compiled for (`major.minor.patch`).
    pub server_version: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            server_version: String::from(DEFAULT_SERVER_VERSION),
        }
    }
}

/// A named search context with its own mapping and relevance tuning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerConfig {
    /// Container name.
    #[serde(skip)]
    pub name: String,
    /// Index queried by the container.
    pub index: String,
    /// Document type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Field catalog.
    #[serde(flatten)]
    pub mapping: Mapping,
    /// Resolved relevance settings (default scope, then container scope).
    pub relevance: RelevanceConfig,
    /// Configured buckets, ordered by name.
    #[serde(rename = "aggregation")]
    pub aggregations: Vec<BucketConfig>,
    /// Default collapse field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<String>,
}

/// Internal struct for TOML serialization of the effective configuration.
#[derive(Serialize)]
struct SerializableConfig<'a> {
    /// Engine settings.
    engine: &'a EngineSettings,
    /// Field mapper overrides.
    field_mapper: &'a BTreeMap<String, FieldMapping>,
    /// Default-scope relevance.
    relevance: &'a RelevanceConfig,
    /// Containers.
    container: &'a BTreeMap<String, ContainerConfig>,
}
