//! Translation of logical field names into physical index paths.

use std::collections::BTreeMap;

use cq_config::{Config, FieldMapping, Mapping, resolve_field_mappings};
use cq_query::QueryNode;

/// Physical location of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    /// Physical field path.
    pub path: String,
    /// Nested document path the field lives under.
    pub nested_path: Option<String>,
}

impl MappedField {
    /// Returns true if the field lives under a nested path.
    pub fn is_nested(&self) -> bool {
        self.nested_path.is_some()
    }

    /// Scopes a query on this field to its nested path, if any.
    pub fn scope(&self, query: QueryNode) -> QueryNode {
        match self.nested_path {
            Some(ref path) => QueryNode::nested(path.clone(), query),
            None => query,
        }
    }
}

/// Maps logical field names (as business rules use them) to physical paths.
///
/// The built-in table covers the category, price and stock blocks; the `[field_mapper]`
/// configuration table overrides it. Names the table does not know pass through unchanged.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    /// Resolved mappings keyed by logical name.
    mappings: BTreeMap<String, FieldMapping>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl FieldMapper {
    /// Creates a mapper from the built-in table with `overrides` applied.
    pub fn new(overrides: &BTreeMap<String, FieldMapping>) -> Self {
        Self {
            mappings: resolve_field_mappings(overrides),
        }
    }

    /// Creates a mapper from the configuration's field mapper overrides.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.field_mapper)
    }

    /// Returns the physical path of a logical field.
    pub fn mapped_field_name(&self, logical: &str) -> String {
        self.mappings
            .get(logical)
            .map_or_else(|| logical.to_string(), |m| m.path.clone())
    }

    /// Returns the physical location of a logical field.
    ///
    /// The nested path comes from the mapper table first, then from the container mapping.
    pub fn map(&self, logical: &str, mapping: &Mapping) -> MappedField {
        match self.mappings.get(logical) {
            Some(entry) => MappedField {
                path: entry.path.clone(),
                nested_path: entry
                    .nested_path
                    .clone()
                    .or_else(|| mapping.nested_path(&entry.path).map(str::to_string)),
            },
            None => MappedField {
                path: logical.to_string(),
                nested_path: mapping.nested_path(logical).map(str::to_string),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use cq_config::{FieldDefinition, FieldType};

    use super::*;

    #[test]
    fn default_table_maps_category_fields() {
        let mapper = FieldMapper::default();
        let mapped = mapper.map("category_id", &Mapping::default());
        assert_eq!(mapped.path, "category.category_id");
        assert_eq!(mapped.nested_path.as_deref(), Some("category"));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let mapper = FieldMapper::default();
        assert_eq!(mapper.mapped_field_name("color"), "color");
        assert_eq!(mapper.map("color", &Mapping::default()).nested_path, None);
    }

    #[test]
    fn unknown_nested_field_takes_path_from_mapping() {
        let mut field = FieldDefinition::new("option.size", FieldType::Keyword);
        field.nested_path = Some("option".into());
        let mapping = Mapping::from_fields([field]);

        let mapped = FieldMapper::default().map("option.size", &mapping);
        assert_eq!(mapped.nested_path.as_deref(), Some("option"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = BTreeMap::from([(
            "price".to_string(),
            FieldMapping {
                path: "final_price".into(),
                nested_path: None,
            },
        )]);
        let mapper = FieldMapper::new(&overrides);
        let mapped = mapper.map("price", &Mapping::default());
        assert_eq!(mapped.path, "final_price");
        assert!(!mapped.is_nested());
    }

    #[test]
    fn scope_wraps_nested_fields() {
        let mapped = FieldMapper::default().map("position", &Mapping::default());
        let query = mapped.scope(QueryNode::term(mapped.path.clone(), 3));
        assert_eq!(query.kind(), "nested");
        query.validate().unwrap();
    }
}
