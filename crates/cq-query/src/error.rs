//! Error types for query construction and parsing.

use thiserror::Error;

/// Errors raised while validating or parsing query trees.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A field inside a nested query does not live under the nested path.
    #[error("field '{field}' is not under nested path '{path}'")]
    NestedPathMismatch {
        /// The nested path of the enclosing `Nested` node.
        path: String,
        /// The offending field reference.
        field: String,
    },

    /// A node carries a negative or non-finite boost.
    #[error("invalid boost {boost} on {node} query: boosts must be finite and non-negative")]
    InvalidBoost {
        /// Kind of node carrying the boost.
        node: &'static str,
        /// The rejected boost value.
        boost: f64,
    },

    /// A node is missing a required field name.
    #[error("{node} query has an empty field name")]
    EmptyField {
        /// Kind of node with the empty field.
        node: &'static str,
    },

    /// Engine-native JSON could not be read back into a query tree.
    #[error("cannot parse query: {message}")]
    Parse {
        /// Description of what was wrong.
        message: String,
    },
}

impl QueryError {
    /// Creates a parse error.
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
