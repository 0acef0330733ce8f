//! Collapse clause rendering.

use cq_config::ContainerConfig;
use serde_json::{Value, json};
use tracing::debug;

use super::{CollapseRequest, SortBuilder};
use crate::{SearchError, field_mapper::FieldMapper};

/// Renders collapse requests.
#[derive(Debug, Clone, Copy)]
pub struct CollapseBuilder<'a> {
    /// Logical to physical field translation.
    field_mapper: &'a FieldMapper,
    /// Container whose mapping resolves the collapse field.
    container: &'a ContainerConfig,
    /// Renders inner hits sorts.
    sort: SortBuilder<'a>,
}

impl<'a> CollapseBuilder<'a> {
    /// Creates a builder.
    pub fn new(field_mapper: &'a FieldMapper, container: &'a ContainerConfig) -> Self {
        Self {
            field_mapper,
            container,
            sort: SortBuilder::new(field_mapper, container),
        }
    }

    /// Renders a collapse clause.
    ///
    /// Inner hits are always rendered as an array; the compatibility pass adapts older
    /// servers. Collapsing on a nested field is an error.
    pub fn build(&self, collapse: &CollapseRequest) -> Result<Value, SearchError> {
        let field = self
            .field_mapper
            .map(&collapse.field, &self.container.mapping);
        if let Some(nested_path) = field.nested_path {
            return Err(SearchError::Collapse {
                field: collapse.field.clone(),
                nested_path,
            });
        }

        let mut clause = json!({ "field": field.path });
        if !collapse.inner_hits.is_empty() {
            let inner_hits = collapse
                .inner_hits
                .iter()
                .map(|inner| {
                    let mut section = json!({
                        "name": inner.name,
                        "size": inner.size,
                        "from": inner.from,
                    });
                    if !inner.sort.is_empty() {
                        section["sort"] = self.sort.build_all(&inner.sort)?;
                    }
                    Ok(section)
                })
                .collect::<Result<Vec<_>, SearchError>>()?;
            clause["inner_hits"] = Value::Array(inner_hits);
        }
        debug!(field = %collapse.field, inner_hits = collapse.inner_hits.len(), "built collapse");
        Ok(clause)
    }
}
