//! Logical to physical field name mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Built-in mappings: logical name, physical path, nested path.
pub const DEFAULT_FIELD_MAPPINGS: &[(&str, &str, Option<&str>)] = &[
    ("category_id", "category.category_id", Some("category")),
    ("position", "category.position", Some("category")),
    ("category_name", "category.name", Some("category")),
    ("price", "price.price", Some("price")),
    ("customer_group_id", "price.customer_group_id", Some("price")),
    ("is_in_stock", "stock.is_in_stock", None),
    ("qty", "stock.qty", None),
];

/// Physical location of a logical field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldMapping {
    /// Physical field path.
    pub path: String,
    /// Nested document path the field lives under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_path: Option<String>,
}

/// Returns the built-in mappings with `overrides` applied on top.
pub fn resolve_field_mappings(
    overrides: &BTreeMap<String, FieldMapping>,
) -> BTreeMap<String, FieldMapping> {
    let mut mappings: BTreeMap<String, FieldMapping> = DEFAULT_FIELD_MAPPINGS
        .iter()
        .map(|(logical, path, nested_path)| {
            (
                (*logical).to_string(),
                FieldMapping {
                    path: (*path).to_string(),
                    nested_path: nested_path.map(str::to_string),
                },
            )
        })
        .collect();
    mappings.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    mappings
}
