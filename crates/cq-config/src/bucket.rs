//! Statically configured aggregation buckets.

use cq_query::FieldValue;
use serde::{Deserialize, Serialize};

/// Default number of buckets returned by a term aggregation.
pub const DEFAULT_BUCKET_SIZE: u32 = 10;

/// Kind of bucket aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketType {
    /// Distinct field values.
    Term,
    /// Fixed-interval numeric histogram.
    Histogram,
    /// Named sub-queries, one bucket each.
    QueryGroup,
}

/// Ordering of term buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketOrder {
    /// Most frequent values first.
    #[default]
    Count,
    /// Values in key order.
    Key,
    /// Values of the best-scoring documents first.
    Relevance,
}

/// A configured aggregation bucket.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BucketConfig {
    /// Bucket name, unique within the container.
    pub name: String,
    /// Bucket kind.
    #[serde(rename = "type")]
    pub kind: BucketType,
    /// Logical field aggregated by term and histogram buckets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Maximum number of term buckets; `0` means unbounded.
    pub size: u32,
    /// Term bucket ordering.
    pub order: BucketOrder,
    /// Minimum document count of a returned bucket.
    pub min_doc_count: u64,
    /// Histogram interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    /// Named sub-queries of a query-group bucket.
    #[serde(rename = "query", skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<GroupQuery>,
}

impl BucketConfig {
    /// Creates a term bucket with default size and ordering.
    pub fn term(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BucketType::Term,
            field: Some(field.into()),
            size: DEFAULT_BUCKET_SIZE,
            order: BucketOrder::default(),
            min_doc_count: 1,
            interval: None,
            queries: Vec::new(),
        }
    }
}

/// One named sub-query of a query-group bucket: an exact value or a range on a field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupQuery {
    /// Bucket key reported for documents matching the sub-query.
    pub name: String,
    /// Logical field the sub-query tests.
    pub field: String,
    /// Exact value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    /// Strictly greater than.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<FieldValue>,
    /// Greater than or equal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<FieldValue>,
    /// Strictly lower than.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<FieldValue>,
    /// Lower than or equal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<FieldValue>,
}

impl GroupQuery {
    /// Returns true if the sub-query sets a range bound.
    pub fn is_range(&self) -> bool {
        self.gt.is_some() || self.gte.is_some() || self.lt.is_some() || self.lte.is_some()
    }
}
