//! Configuration validation.
//!
//! [`check_config`] rejects settings the compiler cannot honor and runs at load time.
//! [`validate_config`] reports non-fatal warnings for the `check` command.

use std::fmt;

use crate::{
    BucketConfig, BucketType, Config, ConfigError, ContainerConfig, MAX_DEPTH_LIMIT,
    RelevanceConfig, field_mapping::resolve_field_mappings,
};

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No containers are defined.
    NoContainersDefined,
    /// A container has no searchable field, so full-text queries use only the search field.
    NoSearchableFields {
        /// Name of the container.
        container: String,
    },
    /// A bucket aggregates a field the mapping does not declare.
    UndeclaredBucketField {
        /// Name of the container.
        container: String,
        /// Name of the bucket.
        bucket: String,
        /// The undeclared field.
        field: String,
    },
    /// Fuzzy or phonetic matching is enabled but no field feeds the spellchecker.
    NoSpellcheckFields {
        /// Name of the container.
        container: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoContainersDefined => write!(f, "no containers are defined in configuration"),
            Self::NoSearchableFields { container } => {
                write!(f, "container '{container}' has no searchable fields")
            }
            Self::UndeclaredBucketField {
                container,
                bucket,
                field,
            } => write!(
                f,
                "bucket '{bucket}' of container '{container}' uses undeclared field '{field}'"
            ),
            Self::NoSpellcheckFields { container } => write!(
                f,
                "container '{container}' enables fuzzy or phonetic matching but has no spellcheck fields"
            ),
        }
    }
}

/// Checks the configuration for settings the compiler cannot honor.
pub fn check_config(config: &Config) -> Result<(), ConfigError> {
    check_relevance(&config.relevance, "default")?;
    for container in config.containers.values() {
        check_container(container)?;
    }
    Ok(())
}

/// Checks one relevance configuration.
fn check_relevance(relevance: &RelevanceConfig, scope: &str) -> Result<(), ConfigError> {
    if let Some(cutoff) = relevance.cutoff_frequency
        && !(0.0..=1.0).contains(&cutoff)
    {
        return Err(ConfigError::invalid(
            scope,
            format!("cutoff_frequency {cutoff} is outside [0, 1]"),
        ));
    }
    let decay = relevance.fuzzy_boost_decay;
    if !(decay > 0.0 && decay <= 1.0) {
        return Err(ConfigError::invalid(
            scope,
            format!("fuzzy_boost_decay {decay} is outside (0, 1]"),
        ));
    }
    if relevance.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::invalid(
            scope,
            format!(
                "max_depth {} exceeds the limit of {MAX_DEPTH_LIMIT}",
                relevance.max_depth
            ),
        ));
    }
    if !relevance.tie_breaker.is_finite() || relevance.tie_breaker < 0.0 {
        return Err(ConfigError::invalid(
            scope,
            format!("tie_breaker {} must be non-negative", relevance.tie_breaker),
        ));
    }
    Ok(())
}

/// Checks a container's relevance, mapping and buckets.
fn check_container(container: &ContainerConfig) -> Result<(), ConfigError> {
    let scope = format!("container '{}'", container.name);
    check_relevance(&container.relevance, &scope)?;

    for field in container.mapping.fields.values() {
        if !field.weight.is_finite() || field.weight < 0.0 {
            return Err(ConfigError::invalid(
                &scope,
                format!("field '{}' has negative weight {}", field.name, field.weight),
            ));
        }
        if !(0.0..=100.0).contains(&field.facet_min_coverage_rate) {
            return Err(ConfigError::invalid(
                &scope,
                format!(
                    "field '{}' has facet_min_coverage_rate {} outside [0, 100]",
                    field.name, field.facet_min_coverage_rate
                ),
            ));
        }
        if let Some(ref path) = field.nested_path
            && !field
                .name
                .strip_prefix(path.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        {
            return Err(ConfigError::invalid(
                &scope,
                format!("field '{}' is not under its nested path '{path}'", field.name),
            ));
        }
    }

    for bucket in &container.aggregations {
        check_bucket(bucket, &scope)?;
    }
    Ok(())
}

/// Checks that a bucket carries the settings its kind requires.
fn check_bucket(bucket: &BucketConfig, scope: &str) -> Result<(), ConfigError> {
    let name = &bucket.name;
    match bucket.kind {
        BucketType::Term if bucket.field.is_none() => Err(ConfigError::invalid(
            scope,
            format!("term bucket '{name}' has no field"),
        )),
        BucketType::Histogram => {
            if bucket.field.is_none() {
                return Err(ConfigError::invalid(
                    scope,
                    format!("histogram bucket '{name}' has no field"),
                ));
            }
            match bucket.interval {
                Some(interval) if interval > 0.0 => Ok(()),
                _ => Err(ConfigError::invalid(
                    scope,
                    format!("histogram bucket '{name}' needs a positive interval"),
                )),
            }
        }
        BucketType::QueryGroup if bucket.queries.is_empty() => Err(ConfigError::invalid(
            scope,
            format!("query group bucket '{name}' has no queries"),
        )),
        _ => Ok(()),
    }
}

/// Returns warnings for settings that are valid but probably unintended.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.containers.is_empty() {
        warnings.push(ConfigWarning::NoContainersDefined);
        return warnings;
    }

    let field_mappings = resolve_field_mappings(&config.field_mapper);
    for container in config.containers.values() {
        let mapping = &container.mapping;
        if mapping.searchable_fields().next().is_none() {
            warnings.push(ConfigWarning::NoSearchableFields {
                container: container.name.clone(),
            });
        }
        let relevance = &container.relevance;
        if (relevance.is_fuzziness_enabled() || relevance.is_phonetic_enabled())
            && mapping.spellcheck_fields().next().is_none()
        {
            warnings.push(ConfigWarning::NoSpellcheckFields {
                container: container.name.clone(),
            });
        }
        for bucket in &container.aggregations {
            let Some(ref field) = bucket.field else {
                continue;
            };
            let physical = field_mappings
                .get(field)
                .map_or(field.as_str(), |m| m.path.as_str());
            if mapping.field(physical).is_none() {
                warnings.push(ConfigWarning::UndeclaredBucketField {
                    container: container.name.clone(),
                    bucket: bucket.name.clone(),
                    field: field.clone(),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldDefinition, FieldType, Mapping};

    fn container(name: &str) -> ContainerConfig {
        ContainerConfig {
            name: name.into(),
            index: name.into(),
            type_name: "product".into(),
            mapping: Mapping::from_fields([FieldDefinition::new("name", FieldType::Text)]),
            relevance: RelevanceConfig::default(),
            aggregations: Vec::new(),
            collapse: None,
        }
    }

    fn config_with(container: ContainerConfig) -> Config {
        let mut config = Config::default();
        config.containers.insert(container.name.clone(), container);
        config
    }

    #[test]
    fn default_config_is_valid() {
        assert!(check_config(&Config::default()).is_ok());
    }

    #[test]
    fn cutoff_out_of_range_is_rejected() {
        let mut config = Config::default();
        config.relevance.cutoff_frequency = Some(1.5);
        let err = check_config(&config).unwrap_err();
        assert!(err.to_string().contains("cutoff_frequency 1.5"));
    }

    #[test]
    fn decay_must_be_positive() {
        let mut catalog = container("catalog");
        catalog.relevance.fuzzy_boost_decay = 0.0;
        let err = check_config(&config_with(catalog)).unwrap_err();
        assert!(err.to_string().contains("container 'catalog'"));
    }

    #[test]
    fn max_depth_is_capped() {
        let mut config = Config::default();
        config.relevance.max_depth = MAX_DEPTH_LIMIT + 1;
        assert!(check_config(&config).is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut catalog = container("catalog");
        catalog.mapping.fields.get_mut("name").unwrap().weight = -1.0;
        assert!(check_config(&config_with(catalog)).is_err());
    }

    #[test]
    fn nested_field_must_live_under_its_path() {
        let mut catalog = container("catalog");
        let mut field = FieldDefinition::new("position", FieldType::Integer);
        field.nested_path = Some("category".into());
        catalog.mapping.fields.insert(field.name.clone(), field);
        let err = check_config(&config_with(catalog)).unwrap_err();
        assert!(err.to_string().contains("not under its nested path 'category'"));
    }

    #[test]
    fn histogram_needs_positive_interval() {
        let mut catalog = container("catalog");
        let mut bucket = BucketConfig::term("price", "price");
        bucket.kind = BucketType::Histogram;
        bucket.interval = Some(0.0);
        catalog.aggregations.push(bucket);
        assert!(check_config(&config_with(catalog)).is_err());
    }

    #[test]
    fn empty_config_warns() {
        assert_eq!(
            validate_config(&Config::default()),
            vec![ConfigWarning::NoContainersDefined]
        );
    }

    #[test]
    fn undeclared_bucket_field_warns() {
        let mut catalog = container("catalog");
        catalog.aggregations.push(BucketConfig::term("color", "color"));
        let warnings = validate_config(&config_with(catalog));
        assert_eq!(
            warnings,
            vec![ConfigWarning::UndeclaredBucketField {
                container: "catalog".into(),
                bucket: "color".into(),
                field: "color".into(),
            }]
        );
    }

    #[test]
    fn bucket_on_mapped_field_does_not_warn() {
        let mut catalog = container("catalog");
        let mut price = FieldDefinition::new("price.price", FieldType::Double);
        price.nested_path = Some("price".into());
        catalog.mapping.fields.insert(price.name.clone(), price);
        catalog.aggregations.push(BucketConfig::term("price", "price"));
        assert!(validate_config(&config_with(catalog)).is_empty());
    }

    #[test]
    fn fuzziness_without_spellcheck_fields_warns() {
        let mut catalog = container("catalog");
        catalog.relevance.fuzziness.enabled = true;
        let warnings = validate_config(&config_with(catalog));
        assert!(warnings.contains(&ConfigWarning::NoSpellcheckFields {
            container: "catalog".into()
        }));
    }
}
