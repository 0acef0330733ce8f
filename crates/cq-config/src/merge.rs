//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`, applying precedence rules
//! across files and the default -> container scope order within them.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use crate::{
    BucketConfig, Config, ConfigError, ContainerConfig, DEFAULT_BUCKET_SIZE, EngineSettings,
    FieldDefinition, FieldMapping, FieldType, Mapping, RelevanceConfig,
    parse::{
        RawBucket, RawConfig, RawContainer, RawField, RawFieldMapping, RawPhraseBoost,
        RawRelevance,
    },
};

/// Default document type of a container.
const DEFAULT_TYPE_NAME: &str = "product";

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Relevance: the default scope of every file is applied first, then the container scope,
///   so a container setting in any file beats a default setting in any file
/// - Containers: merged by name; fields, aggregations and field mapper entries are merged by
///   name with the first definition winning completely
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let engine = merge_engine(configs);
    let field_mapper = merge_field_mapper(configs);
    let relevance = merge_default_relevance(configs)?;
    let containers = merge_containers(configs, &relevance)?;
    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(|p| p.to_path_buf());

    Ok(Config {
        engine,
        field_mapper,
        relevance,
        containers,
        config_root,
    })
}

/// Merges engine settings, taking first defined value for each field.
fn merge_engine(configs: &[ParsedConfig]) -> EngineSettings {
    let mut result = EngineSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref engine) = parsed.config.engine
            && let Some(ref version) = engine.server_version
        {
            result.server_version.clone_from(version);
        }
    }

    result
}

/// Merges field mapper overrides by logical name, first definition wins.
fn merge_field_mapper(configs: &[ParsedConfig]) -> BTreeMap<String, FieldMapping> {
    let mut result = BTreeMap::new();

    for parsed in configs {
        let Some(ref mapper) = parsed.config.field_mapper else {
            continue;
        };
        for (name, raw) in mapper {
            result
                .entry(name.clone())
                .or_insert_with(|| convert_field_mapping(raw));
        }
    }

    result
}

/// Converts a raw field mapper entry.
fn convert_field_mapping(raw: &RawFieldMapping) -> FieldMapping {
    match raw {
        RawFieldMapping::Path(path) => FieldMapping {
            path: path.clone(),
            nested_path: None,
        },
        RawFieldMapping::Detailed { path, nested_path } => FieldMapping {
            path: path.clone(),
            nested_path: nested_path.clone(),
        },
    }
}

/// Merges the default relevance scope of every file.
fn merge_default_relevance(configs: &[ParsedConfig]) -> Result<RelevanceConfig, ConfigError> {
    let mut result = RelevanceConfig::default();

    for parsed in configs.iter().rev() {
        if let Some(ref relevance) = parsed.config.relevance {
            apply_raw_relevance(&mut result, relevance, "default")?;
        }
    }

    Ok(result)
}

/// Applies raw relevance settings to result, overwriting any present values.
fn apply_raw_relevance(
    result: &mut RelevanceConfig,
    raw: &RawRelevance,
    scope: &str,
) -> Result<(), ConfigError> {
    match raw.phrase_match_boost {
        Some(RawPhraseBoost::Boost(boost)) => result.phrase_match_boost = Some(boost),
        Some(RawPhraseBoost::Toggle(false)) => result.phrase_match_boost = None,
        Some(RawPhraseBoost::Toggle(true)) => {
            return Err(ConfigError::invalid(
                scope,
                "phrase_match_boost must be false or an integer boost",
            ));
        }
        None => {}
    }
    if let Some(v) = raw.cutoff_frequency {
        result.cutoff_frequency = Some(v);
    }
    if let Some(ref v) = raw.minimum_should_match {
        result.minimum_should_match.clone_from(v);
    }
    if let Some(v) = raw.tie_breaker {
        result.tie_breaker = v;
    }
    if let Some(v) = raw.fuzzy_boost_decay {
        result.fuzzy_boost_decay = v;
    }
    if let Some(v) = raw.max_depth {
        result.max_depth = v;
    }
    if let Some(ref fuzziness) = raw.fuzziness {
        let target = &mut result.fuzziness;
        if let Some(v) = fuzziness.enabled {
            target.enabled = v;
        }
        if let Some(ref v) = fuzziness.value {
            target.value.clone_from(v);
        }
        if let Some(v) = fuzziness.prefix_length {
            target.prefix_length = v;
        }
        if let Some(v) = fuzziness.max_expansions {
            target.max_expansions = v;
        }
        if let Some(ref v) = fuzziness.minimum_should_match {
            target.minimum_should_match.clone_from(v);
        }
    }
    if let Some(ref phonetic) = raw.phonetic
        && let Some(v) = phonetic.enabled
    {
        result.phonetic.enabled = v;
    }
    Ok(())
}

/// Merges containers from all configs.
fn merge_containers(
    configs: &[ParsedConfig],
    default_relevance: &RelevanceConfig,
) -> Result<BTreeMap<String, ContainerConfig>, ConfigError> {
    let names: BTreeSet<&String> = configs
        .iter()
        .filter_map(|parsed| parsed.config.container.as_ref())
        .flat_map(|containers| containers.keys())
        .collect();

    let mut result = BTreeMap::new();
    for name in names {
        // Highest precedence first
        let raws: Vec<&RawContainer> = configs
            .iter()
            .filter_map(|parsed| parsed.config.container.as_ref()?.get(name))
            .collect();
        result.insert(
            name.clone(),
            merge_container(name, &raws, default_relevance)?,
        );
    }
    Ok(result)
}

/// Merges every definition of one container, highest precedence first.
fn merge_container(
    name: &str,
    raws: &[&RawContainer],
    default_relevance: &RelevanceConfig,
) -> Result<ContainerConfig, ConfigError> {
    let scope = format!("container '{name}'");
    let mut container = ContainerConfig {
        name: name.to_string(),
        index: name.to_string(),
        type_name: String::from(DEFAULT_TYPE_NAME),
        mapping: Mapping::default(),
        relevance: default_relevance.clone(),
        aggregations: Vec::new(),
        collapse: None,
    };

    for raw in raws.iter().rev() {
        if let Some(ref v) = raw.index {
            container.index.clone_from(v);
        }
        if let Some(ref v) = raw.type_name {
            container.type_name.clone_from(v);
        }
        if let Some(ref v) = raw.search_field {
            container.mapping.search_field.clone_from(v);
        }
        if let Some(ref v) = raw.spelling_field {
            container.mapping.spelling_field.clone_from(v);
        }
        if let Some(ref v) = raw.collapse {
            container.collapse = Some(v.clone());
        }
        if let Some(ref relevance) = raw.relevance {
            apply_raw_relevance(&mut container.relevance, relevance, &scope)?;
        }
    }

    let mut aggregations: BTreeMap<String, BucketConfig> = BTreeMap::new();
    for raw in raws {
        for (field_name, raw_field) in raw.field.iter().flatten() {
            container
                .mapping
                .fields
                .entry(field_name.clone())
                .or_insert_with(|| convert_field(field_name, raw_field));
        }
        for raw_bucket in raw.aggregation.iter().flatten() {
            aggregations
                .entry(raw_bucket.name.clone())
                .or_insert_with(|| convert_bucket(raw_bucket));
        }
    }
    container.aggregations = aggregations.into_values().collect();

    Ok(container)
}

/// Converts a raw field to the final type with defaults applied.
fn convert_field(name: &str, raw: &RawField) -> FieldDefinition {
    let field_type = raw.field_type.unwrap_or(FieldType::Text);
    let defaults = FieldDefinition::new(name, field_type);
    FieldDefinition {
        weight: raw.weight.unwrap_or(defaults.weight),
        searchable: raw.searchable.unwrap_or(defaults.searchable),
        filterable: raw.filterable.unwrap_or(defaults.filterable),
        spellcheck: raw.spellcheck.unwrap_or(defaults.spellcheck),
        nested_path: raw.nested_path.clone(),
        facet_min_coverage_rate: raw
            .facet_min_coverage_rate
            .unwrap_or(defaults.facet_min_coverage_rate),
        ..defaults
    }
}

/// Converts a raw bucket to the final type with defaults applied.
fn convert_bucket(raw: &RawBucket) -> BucketConfig {
    BucketConfig {
        name: raw.name.clone(),
        kind: raw.kind,
        field: raw.field.clone(),
        size: raw.size.unwrap_or(DEFAULT_BUCKET_SIZE),
        order: raw.order.unwrap_or_default(),
        min_doc_count: raw.min_doc_count.unwrap_or(1),
        interval: raw.interval,
        queries: raw.queries.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{BucketType, parse::parse_config_str, test_support::TestDir};

    fn parsed(path: PathBuf, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path,
            config: parse_config_str(toml, Path::new("test")).unwrap(),
        }
    }

    #[test]
    fn test_merge_empty_configs() {
        let result = merge_configs(&[]).unwrap();
        assert_eq!(result.relevance, RelevanceConfig::default());
        assert!(result.containers.is_empty());
    }

    #[test]
    fn test_container_scope_beats_default_scope() {
        let test_dir = TestDir::new();
        let config = parsed(
            test_dir.path().join(".cq.toml"),
            r#"
[relevance]
cutoff_frequency = 0.1
minimum_should_match = "75%"

[container.catalog.relevance]
cutoff_frequency = 0.2
"#,
        );

        let result = merge_configs(&[config]).unwrap();
        let catalog = &result.containers["catalog"];
        assert_eq!(result.relevance.cutoff_frequency, Some(0.1));
        assert_eq!(catalog.relevance.cutoff_frequency, Some(0.2));
        // Inherited from the default scope
        assert_eq!(catalog.relevance.minimum_should_match, "75%");
        assert_eq!(catalog.index, "catalog");
        assert_eq!(catalog.type_name, "product");
    }

    #[test]
    fn test_container_scope_in_global_beats_local_default() {
        let test_dir = TestDir::new();
        let local = parsed(
            test_dir.path().join("project/.cq.toml"),
            "[relevance]\nphrase_match_boost = 5\n",
        );
        let global = parsed(
            test_dir.path().join(".cq.toml"),
            "[container.catalog.relevance]\nphrase_match_boost = 10\n",
        );

        let result = merge_configs(&[local, global]).unwrap();
        assert_eq!(result.relevance.phrase_match_boost, Some(5));
        assert_eq!(
            result.containers["catalog"].relevance.phrase_match_boost,
            Some(10)
        );
    }

    #[test]
    fn test_scalar_override_closest_wins() {
        let test_dir = TestDir::new();
        let high = parsed(
            test_dir.path().join("project/.cq.toml"),
            "[engine]\nserver_version = \"8.11.0\"\n",
        );
        let low = parsed(
            test_dir.path().join(".cq.toml"),
            r#"
[engine]
server_version = "6.8.0"

[relevance.fuzziness]
enabled = true
"#,
        );

        let result = merge_configs(&[high, low]).unwrap();
        assert_eq!(result.engine.server_version, "8.11.0");
        assert!(result.relevance.fuzziness.enabled);
        assert_eq!(
            result.config_root,
            Some(test_dir.path().join("project"))
        );
    }

    #[test]
    fn test_phrase_boost_false_disables() {
        let test_dir = TestDir::new();
        let high = parsed(
            test_dir.path().join("project/.cq.toml"),
            "[relevance]\nphrase_match_boost = false\n",
        );
        let low = parsed(
            test_dir.path().join(".cq.toml"),
            "[relevance]\nphrase_match_boost = 10\n",
        );

        let result = merge_configs(&[high, low]).unwrap();
        assert!(result.relevance.phrase_match_boost.is_none());
    }

    #[test]
    fn test_phrase_boost_true_is_invalid() {
        let test_dir = TestDir::new();
        let config = parsed(
            test_dir.path().join(".cq.toml"),
            "[relevance]\nphrase_match_boost = true\n",
        );
        let err = merge_configs(&[config]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_fields_and_buckets_first_definition_wins() {
        let test_dir = TestDir::new();
        let high = parsed(
            test_dir.path().join("project/.cq.toml"),
            r#"
[container.catalog.field.name]
weight = 5

[[container.catalog.aggregation]]
name = "color"
type = "term"
field = "color"
size = 0
"#,
        );
        let low = parsed(
            test_dir.path().join(".cq.toml"),
            r#"
[container.catalog.field.name]
weight = 2
spellcheck = true

[container.catalog.field.sku]
type = "keyword"

[[container.catalog.aggregation]]
name = "color"
type = "term"
field = "colour"

[[container.catalog.aggregation]]
name = "brand"
type = "term"
field = "brand"
"#,
        );

        let result = merge_configs(&[high, low]).unwrap();
        let catalog = &result.containers["catalog"];
        let name = catalog.mapping.field("name").unwrap();
        assert_eq!(name.weight, 5.0);
        // The whole definition comes from the winning file
        assert!(!name.spellcheck);
        assert!(!catalog.mapping.field("sku").unwrap().searchable);

        let buckets: Vec<&str> = catalog.aggregations.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(buckets, vec!["brand", "color"]);
        let color = &catalog.aggregations[1];
        assert_eq!(color.field.as_deref(), Some("color"));
        assert_eq!(color.size, 0);
        assert_eq!(color.kind, BucketType::Term);
        assert_eq!(catalog.aggregations[0].size, DEFAULT_BUCKET_SIZE);
    }

    #[test]
    fn test_field_mapper_first_wins() {
        let test_dir = TestDir::new();
        let high = parsed(
            test_dir.path().join("project/.cq.toml"),
            "[field_mapper]\nprice = \"final_price.price\"\n",
        );
        let low = parsed(
            test_dir.path().join(".cq.toml"),
            r#"
[field_mapper]
price = "price.value"
store = { path = "stock.store_id", nested_path = "stock" }
"#,
        );

        let result = merge_configs(&[high, low]).unwrap();
        assert_eq!(result.field_mapper["price"].path, "final_price.price");
        assert_eq!(
            result.field_mapper["store"].nested_path.as_deref(),
            Some("stock")
        );
    }
}
