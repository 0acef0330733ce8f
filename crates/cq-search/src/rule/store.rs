//! Category storage boundary.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use super::Category;
use crate::SearchError;

/// Supplies category records to the rule resolver.
pub trait CategoryStore: Send + Sync {
    /// Returns the category with `id`, if it exists.
    fn category(&self, id: u64) -> Option<Category>;
}

/// Category store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryStore {
    /// Categories keyed by id.
    categories: BTreeMap<u64, Category>,
}

/// On-disk shape of a category file.
#[derive(Debug, Deserialize)]
struct CategoryFile {
    /// Category records.
    #[serde(default)]
    category: Vec<Category>,
}

impl InMemoryCategoryStore {
    /// Creates a store from category records. Later records replace earlier ones with the
    /// same id.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Parses a store from TOML `[[category]]` tables.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, SearchError> {
        let file: CategoryFile =
            toml::from_str(content).map_err(|source| SearchError::ParseCategories {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(file.category))
    }

    /// Loads a store from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let content = fs::read_to_string(path).map_err(|source| SearchError::ReadCategories {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Adds or replaces a category.
    pub fn insert(&mut self, category: Category) {
        self.categories.insert(category.id, category);
    }

    /// Iterates over categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Returns the number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if the store holds no category.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CategoryStore for InMemoryCategoryStore {
    fn category(&self, id: u64) -> Option<Category> {
        self.categories.get(&id).cloned()
    }
}
