//! Structural checks on query trees.

use crate::{QueryError, QueryNode};

impl QueryNode {
    /// Checks the structural invariants of the tree.
    ///
    /// Every boost must be finite and non-negative, every leaf must name a field, and every
    /// field referenced below a `Nested` node must live under its path.
    pub fn validate(&self) -> Result<(), QueryError> {
        self.validate_in(None)
    }

    /// Validates the node against the innermost enclosing nested path.
    fn validate_in(&self, nested_path: Option<&str>) -> Result<(), QueryError> {
        let boost = self.boost();
        if !boost.is_finite() || boost < 0.0 {
            return Err(QueryError::InvalidBoost {
                node: self.kind(),
                boost,
            });
        }

        let fields = self.own_fields();
        if matches!(self, Self::MultiMatch { .. }) && fields.is_empty() {
            return Err(QueryError::EmptyField { node: self.kind() });
        }
        for field in fields {
            if field.is_empty() {
                return Err(QueryError::EmptyField { node: self.kind() });
            }
            if let Some(path) = nested_path {
                check_scoped(path, field)?;
            }
        }

        let scope = match self {
            Self::Nested { path, .. } => {
                if path.is_empty() {
                    return Err(QueryError::EmptyField { node: self.kind() });
                }
                if let Some(outer) = nested_path {
                    check_scoped(outer, path)?;
                }
                Some(path.as_str())
            }
            _ => nested_path,
        };
        for child in self.children() {
            child.validate_in(scope)?;
        }
        Ok(())
    }
}

/// Requires `field` to start with `path.`.
fn check_scoped(path: &str, field: &str) -> Result<(), QueryError> {
    let scoped = field
        .strip_prefix(path)
        .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1);
    if scoped {
        Ok(())
    } else {
        Err(QueryError::NestedPathMismatch {
            path: path.to_string(),
            field: field.to_string(),
        })
    }
}
