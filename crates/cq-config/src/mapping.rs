//! Field catalog of a search container.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Full-text field every document copies its searchable content into.
pub const DEFAULT_SEARCH_FIELD: &str = "search";

/// Field every document copies its spellcheck content into.
pub const DEFAULT_SPELLING_FIELD: &str = "spelling";

/// Type of an indexed field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed text.
    #[default]
    Text,
    /// Exact keyword.
    Keyword,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Floating point number.
    Double,
    /// Boolean.
    Boolean,
    /// Date.
    Date,
}

impl FieldType {
    /// Returns true for analyzed text fields.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Analyzer sub-fields derived by naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Whitespace-tokenized sub-field used for fuzzy matching.
    Whitespace,
    /// Shingle sub-field used for phrase matching.
    Shingle,
    /// Normalized keyword sub-field used for sorting text fields.
    Sortable,
    /// Phonetic-encoded sub-field.
    Phonetic,
}

impl Analyzer {
    /// Returns the sub-field suffix of the analyzer.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Shingle => "shingle",
            Self::Sortable => "sortable",
            Self::Phonetic => "phonetic",
        }
    }

    /// Returns the analyzed sub-field path of `field`.
    pub fn sub_field(self, field: &str) -> String {
        format!("{field}.{}", self.suffix())
    }
}

/// Definition of one field in the container mapping.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldDefinition {
    /// Physical field path.
    #[serde(skip)]
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Relevance weight in full-text queries.
    pub weight: f64,
    /// Whether the field takes part in full-text queries.
    pub searchable: bool,
    /// Whether the field can be filtered and faceted on.
    pub filterable: bool,
    /// Whether the field feeds the spellchecker and fuzzy branches.
    pub spellcheck: bool,
    /// Nested document path the field lives under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_path: Option<String>,
    /// Minimum coverage rate (percent of matching documents) for the field's facet to show.
    pub facet_min_coverage_rate: f64,
}

impl FieldDefinition {
    /// Creates a field definition with defaults for the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            weight: 1.0,
            searchable: field_type.is_text(),
            filterable: true,
            spellcheck: false,
            nested_path: None,
            facet_min_coverage_rate: 0.0,
        }
    }

    /// Returns true if the field lives under a nested document path.
    pub fn is_nested(&self) -> bool {
        self.nested_path.is_some()
    }
}

/// Field catalog of a container, ordered by field name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Mapping {
    /// Field definitions keyed by physical path.
    #[serde(rename = "field")]
    pub fields: BTreeMap<String, FieldDefinition>,
    /// Default full-text field.
    pub search_field: String,
    /// Spellcheck field.
    pub spelling_field: String,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            search_field: String::from(DEFAULT_SEARCH_FIELD),
            spelling_field: String::from(DEFAULT_SPELLING_FIELD),
        }
    }
}

impl Mapping {
    /// Creates a mapping from field definitions.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            ..Self::default()
        }
    }

    /// Looks up a field definition.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Returns the nested path declared for `name`, if any.
    ///
    /// Fields not declared in the mapping are matched against the nested paths of declared
    /// fields, so `category.anything` resolves to `category` when any declared field is nested
    /// there.
    pub fn nested_path(&self, name: &str) -> Option<&str> {
        if let Some(field) = self.fields.get(name) {
            return field.nested_path.as_deref();
        }
        self.nested_paths()
            .into_iter()
            .find(|path| name.strip_prefix(path).is_some_and(|rest| rest.starts_with('.')))
    }

    /// Returns the distinct nested paths declared by the mapping.
    pub fn nested_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .fields
            .values()
            .filter_map(|f| f.nested_path.as_deref())
            .collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    /// Returns searchable fields that are not nested, ordered by name.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .values()
            .filter(|f| f.searchable && !f.is_nested())
    }

    /// Returns spellcheck fields that are not nested, ordered by name.
    pub fn spellcheck_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .values()
            .filter(|f| f.spellcheck && !f.is_nested())
    }
}
