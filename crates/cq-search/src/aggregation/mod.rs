//! Aggregation requests.
//!
//! Providers contribute named [`BucketRequest`]s for a search; the [`AggregationResolver`]
//! merges them and the [`AggregationBuilder`] renders the result as engine aggregations.

mod builder;
mod provider;

use cq_config::{BucketOrder, ContainerConfig};
use cq_query::QueryNode;
use indexmap::IndexMap;
use tracing::debug;

pub use builder::{AggregationBuilder, UNBOUNDED_BUCKET_SIZE};
pub use provider::{
    ATTRIBUTE_SET_BUCKET, ConfiguredAggregations, CoverageAggregations, CoverageRateFilter,
    INDEXED_ATTRIBUTES_BUCKET,
};

/// A named aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRequest {
    /// Bucket name, also used for every wrapper level.
    pub name: String,
    /// What the bucket aggregates.
    pub kind: BucketKind,
    /// Nested path of the aggregated field.
    pub nested_path: Option<String>,
    /// Filter applied to nested documents before aggregating.
    pub nested_filter: Option<QueryNode>,
    /// Filter applied to the documents before aggregating.
    pub filter: Option<QueryNode>,
}

/// Kind of a bucket aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketKind {
    /// One bucket per distinct value.
    Term {
        /// Physical field.
        field: String,
        /// Number of buckets; `0` means unbounded.
        size: u32,
        /// Bucket order.
        order: BucketOrder,
        /// Minimum document count of a bucket.
        min_doc_count: u64,
    },
    /// Fixed-interval numeric buckets.
    Histogram {
        /// Physical field.
        field: String,
        /// Bucket width.
        interval: f64,
        /// Minimum document count of a bucket.
        min_doc_count: u64,
    },
    /// One bucket per named query.
    QueryGroup {
        /// Queries keyed by bucket key.
        queries: IndexMap<String, QueryNode>,
    },
}

impl BucketRequest {
    /// Creates a term bucket ordered by count.
    pub fn term(name: impl Into<String>, field: impl Into<String>, size: u32) -> Self {
        Self::new(
            name,
            BucketKind::Term {
                field: field.into(),
                size,
                order: BucketOrder::Count,
                min_doc_count: 1,
            },
        )
    }

    /// Creates a bucket of the given kind with no nesting or filter.
    pub fn new(name: impl Into<String>, kind: BucketKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nested_path: None,
            nested_filter: None,
            filter: None,
        }
    }

    /// Returns the aggregated field, if the bucket aggregates one.
    pub fn field(&self) -> Option<&str> {
        match self.kind {
            BucketKind::Term { ref field, .. } | BucketKind::Histogram { ref field, .. } => {
                Some(field)
            }
            BucketKind::QueryGroup { .. } => None,
        }
    }
}

/// Supplies aggregations for a search.
pub trait AggregationProvider: Send + Sync {
    /// Returns the buckets to compute, keyed by name.
    ///
    /// `filters` holds the facet filters of the request keyed by facet name; `query_filters`
    /// the structural filters already applied to the query.
    fn aggregations(
        &self,
        container: &ContainerConfig,
        query: &QueryNode,
        filters: &IndexMap<String, QueryNode>,
        query_filters: &[QueryNode],
    ) -> IndexMap<String, BucketRequest>;
}

/// Chains providers; later providers replace earlier buckets of the same name.
#[derive(Default)]
pub struct AggregationResolver {
    /// Providers in application order.
    providers: Vec<Box<dyn AggregationProvider>>,
}

impl AggregationResolver {
    /// Creates a resolver without providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl AggregationProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Returns the number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if the resolver has no provider.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Collects the buckets of every provider.
    ///
    /// Names keep the position where they were first seen.
    pub fn resolve(
        &self,
        container: &ContainerConfig,
        query: &QueryNode,
        filters: &IndexMap<String, QueryNode>,
        query_filters: &[QueryNode],
    ) -> IndexMap<String, BucketRequest> {
        let mut merged = IndexMap::new();
        for provider in &self.providers {
            merged.extend(provider.aggregations(container, query, filters, query_filters));
        }
        debug!(container = %container.name, buckets = merged.len(), "resolved aggregations");
        merged
    }
}
