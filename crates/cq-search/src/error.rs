//! Error types for the cq-search crate.

use std::{io, path::PathBuf};

use cq_query::QueryError;
use thiserror::Error;
use toml::de;

use crate::{compat::CompatError, engine::EngineError};

/// Errors raised while compiling a request or mapping a response.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request names a container the configuration does not define.
    #[error("unknown container '{name}'")]
    UnknownContainer {
        /// Requested container name.
        name: String,
    },

    /// A compiled query node is structurally invalid.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Collapsing was requested on a field under a nested path.
    #[error("cannot collapse on '{field}': it lives under nested path '{nested_path}'")]
    Collapse {
        /// Requested collapse field.
        field: String,
        /// Nested path the field lives under.
        nested_path: String,
    },

    /// The request cannot be expressed for the target server version.
    #[error(transparent)]
    Compat(#[from] CompatError),

    /// The engine failed to execute the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine response could not be read.
    #[error("invalid engine response: {message}")]
    Response {
        /// What was wrong with the response.
        message: String,
    },

    /// A category id was not found in the category store.
    #[error("unknown category {id}")]
    UnknownCategory {
        /// Requested category id.
        id: u64,
    },

    /// Failed to read a category file.
    #[error("failed to read categories from {path}: {source}")]
    ReadCategories {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse a category file.
    #[error("failed to parse categories from {path}: {source}")]
    ParseCategories {
        /// Path to the file.
        path: PathBuf,
        /// Underlying TOML error.
        source: de::Error,
    },
}

/// Errors raised while parsing a textual condition, sort order or spelling type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The condition contains no comparison operator.
    #[error("invalid condition '{input}': no operator")]
    MissingOperator {
        /// The rejected condition.
        input: String,
    },

    /// The condition has nothing before its operator.
    #[error("invalid condition '{input}': missing attribute")]
    MissingAttribute {
        /// The rejected condition.
        input: String,
    },

    /// The sort direction is neither `asc` nor `desc`.
    #[error("unknown sort direction '{direction}'")]
    UnknownSortDirection {
        /// The rejected direction.
        direction: String,
    },

    /// The sort order has a direction but no field.
    #[error("missing sort field in '{input}'")]
    MissingSortField {
        /// The rejected sort order.
        input: String,
    },

    /// The name matches no spelling type.
    #[error("unknown spelling type '{name}'")]
    UnknownSpellingType {
        /// The rejected name.
        name: String,
    },
}

impl SearchError {
    /// Creates a `Response` error.
    pub(crate) fn response(message: impl Into<String>) -> Self {
        Self::Response {
            message: message.into(),
        }
    }
}
