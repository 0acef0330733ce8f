//! Sort clause rendering.

use cq_config::{Analyzer, ContainerConfig};
use cq_query::QueryNode;
use serde_json::{Map, Value, json};

use super::{SCORE_FIELD, SortDirection, SortOrder};
use crate::{SearchError, field_mapper::FieldMapper};

/// Renders sort orders against a container mapping.
///
/// Text fields sort on their `sortable` sub-field. Nested fields sort on the best nested value
/// (`min` ascending, `max` descending), restricted by the order's nested filter.
#[derive(Debug, Clone, Copy)]
pub struct SortBuilder<'a> {
    /// Logical to physical field translation.
    field_mapper: &'a FieldMapper,
    /// Container whose mapping resolves fields.
    container: &'a ContainerConfig,
}

impl<'a> SortBuilder<'a> {
    /// Creates a builder.
    pub fn new(field_mapper: &'a FieldMapper, container: &'a ContainerConfig) -> Self {
        Self {
            field_mapper,
            container,
        }
    }

    /// Renders every order.
    pub fn build_all(&self, orders: &[SortOrder]) -> Result<Value, SearchError> {
        orders
            .iter()
            .map(|order| self.build(order))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// Renders one order.
    pub fn build(&self, order: &SortOrder) -> Result<Value, SearchError> {
        let direction = order.direction.as_str();
        if order.field == SCORE_FIELD {
            return Ok(json!({ SCORE_FIELD: { "order": direction } }));
        }

        let mapping = &self.container.mapping;
        let field = self.field_mapper.map(&order.field, mapping);
        let path = match mapping.field(&field.path) {
            Some(definition) if definition.field_type.is_text() => {
                Analyzer::Sortable.sub_field(&field.path)
            }
            _ => field.path.clone(),
        };

        let mut clause = Map::new();
        clause.insert("order".into(), json!(direction));
        if let Some(missing) = order.missing {
            clause.insert("missing".into(), json!(missing.as_str()));
        }
        if let Some(ref nested_path) = field.nested_path {
            let mode = match order.direction {
                SortDirection::Asc => "min",
                SortDirection::Desc => "max",
            };
            clause.insert("mode".into(), json!(mode));
            let mut nested = Map::new();
            nested.insert("path".into(), json!(nested_path));
            if let Some(ref filter) = order.nested_filter {
                QueryNode::nested(nested_path.clone(), filter.clone()).validate()?;
                nested.insert("filter".into(), filter.to_json());
            }
            clause.insert("nested".into(), Value::Object(nested));
        }

        Ok(json!({ path: clause }))
    }
}
