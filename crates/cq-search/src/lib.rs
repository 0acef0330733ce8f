//! Search request compiler for catalog search.
//!
//! Turns abstract search requests into engine-native request bodies:
//!
//! - [`FulltextQueryBuilder`] expands free text into exact, fuzzy and phonetic branches,
//!   weighted by the container's relevance settings and the query's [`SpellingType`].
//! - [`VirtualRuleResolver`] compiles category membership rules into filters, following
//!   category references and cutting cycles.
//! - [`AggregationResolver`] collects facet buckets from its providers and
//!   [`AggregationBuilder`] renders them.
//! - [`RequestMapper`] assembles the full request (query, post filter, aggregations, sort,
//!   collapse, paging) and [`CompatibilityPass`] adapts it to the target server version.
//! - [`ResponseMapper`] normalizes the engine's answer into a [`SearchResponse`].
//!
//! [`SearchService`] chains the above around an [`EngineClient`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cq_config::Config;
//! use cq_search::{RequestMapper, SearchRequest};
//!
//! let config = Config::default();
//! let mapper = RequestMapper::new(Arc::new(config));
//! assert!(mapper.build(&SearchRequest::new("catalog")).is_err());
//! ```

#![warn(missing_docs)]

pub mod aggregation;
pub mod compat;
pub mod engine;
mod error;
mod field_mapper;
mod fulltext;
pub mod request;
mod response;
pub mod rule;
mod spellcheck;
#[cfg(test)]
mod test_support;

pub use aggregation::{AggregationBuilder, AggregationProvider, AggregationResolver};
pub use compat::{CompatError, CompatibilityPass, ServerVersion};
pub use engine::{EngineClient, EngineError, SearchService};
pub use error::{ParseError, SearchError};
pub use field_mapper::{FieldMapper, MappedField};
pub use fulltext::FulltextQueryBuilder;
pub use request::{RequestMapper, RequestQuery, SearchRequest, SortDirection, SortOrder};
pub use response::{AttributeCoverage, Document, ResponseMapper, SearchResponse};
pub use rule::{Category, CategoryStore, InMemoryCategoryStore, VirtualRule, VirtualRuleResolver};
pub use spellcheck::{
    FixedSpellchecker, Spelling, SpellingType, Spellchecker, VocabularySpellchecker,
};
