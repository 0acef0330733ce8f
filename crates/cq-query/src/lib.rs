//! Query node IR for the cq search request compiler.
//!
//! Every query the compiler produces is a [`QueryNode`]: a closed tree of typed nodes that
//! mirrors the engine's query DSL without being tied to its JSON shape:
//!
//! - **Leaves**: `Term`, `Terms`, `Range`, `Exists`, `Match`, `MultiMatch`, `Common`,
//!   `MatchAll`, `MatchNone`
//! - **Combinators**: `Bool`, `Not`, `Filtered`
//! - **Scoping**: `Nested` restricts its query to a nested document path
//!
//! Nodes are rendered to engine-native JSON with [`QueryNode::to_json`] and read back with
//! [`QueryNode::from_json`]. [`QueryNode::validate`] checks the structural invariants (boost
//! range, nested path scoping) before a tree is sent anywhere.
//!
//! # Example
//!
//! ```
//! use cq_query::QueryNode;
//!
//! let query = QueryNode::and(vec![
//!     QueryNode::term("color", "red"),
//!     QueryNode::nested("category", QueryNode::term("category.category_id", 12)),
//! ]);
//! assert!(query.validate().is_ok());
//! assert!(query.to_json().get("bool").is_some());
//! ```

#![warn(missing_docs)]

mod error;
mod node;
mod parse;
mod render;
mod validate;

pub use error::QueryError;
pub use node::{BoolQuery, FieldValue, Fuzziness, QueryNode, RangeBounds, ScoreMode, WeightedField};
