//! Shared fixtures for unit tests.

use cq_config::{
    BucketConfig, ContainerConfig, FieldDefinition, FieldType, Mapping, RelevanceConfig,
};

/// Returns a field definition under a nested path.
pub fn nested_field(name: &str, field_type: FieldType, path: &str) -> FieldDefinition {
    let mut field = FieldDefinition::new(name, field_type);
    field.nested_path = Some(path.to_string());
    field.searchable = false;
    field
}

/// Returns a catalog container with weighted text fields and nested category and price blocks.
pub fn container() -> ContainerConfig {
    let mut name = FieldDefinition::new("name", FieldType::Text);
    name.weight = 3.0;
    name.spellcheck = true;
    let mut sku = FieldDefinition::new("sku", FieldType::Text);
    sku.weight = 1.0;
    let mut color = FieldDefinition::new("color", FieldType::Keyword);
    color.facet_min_coverage_rate = 10.0;

    ContainerConfig {
        name: "catalog".into(),
        index: "catalog_products".into(),
        type_name: "product".into(),
        mapping: Mapping::from_fields([
            name,
            sku,
            color,
            nested_field("category.category_id", FieldType::Integer, "category"),
            nested_field("category.position", FieldType::Integer, "category"),
            nested_field("price.price", FieldType::Double, "price"),
        ]),
        relevance: RelevanceConfig::default(),
        aggregations: vec![BucketConfig::term("color", "color")],
        collapse: None,
    }
}
