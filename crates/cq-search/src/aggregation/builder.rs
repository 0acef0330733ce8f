//! Rendering of bucket requests as engine aggregations.

use cq_config::BucketOrder;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use super::{BucketKind, BucketRequest};

/// Size sent for term buckets configured with size `0`.
pub const UNBOUNDED_BUCKET_SIZE: u32 = 10_000;

/// Name of the sub-aggregation holding the best score of a bucket.
const MAX_SCORE_AGGREGATION: &str = "max_score";

/// Renders bucket requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationBuilder;

impl AggregationBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Renders every bucket into one `aggregations` object.
    pub fn build_all(&self, buckets: &IndexMap<String, BucketRequest>) -> Value {
        let aggregations: Map<String, Value> = buckets
            .values()
            .map(|bucket| self.build_bucket(bucket))
            .collect();
        Value::Object(aggregations)
    }

    /// Renders one bucket, returning its name and aggregation.
    ///
    /// Wrapper levels reuse the bucket name, outermost first: filter, nested, nested filter.
    pub fn build_bucket(&self, bucket: &BucketRequest) -> (String, Value) {
        let name = &bucket.name;
        let mut aggregation = bucket_body(&bucket.kind);

        if let Some(ref nested_filter) = bucket.nested_filter {
            aggregation = json!({
                "filter": nested_filter.to_json(),
                "aggregations": { name.as_str(): aggregation },
            });
        }
        if let Some(ref path) = bucket.nested_path {
            aggregation = json!({
                "nested": { "path": path },
                "aggregations": { name.as_str(): aggregation },
            });
        }
        if let Some(ref filter) = bucket.filter {
            aggregation = json!({
                "filter": filter.to_json(),
                "aggregations": { name.as_str(): aggregation },
            });
        }

        (name.clone(), aggregation)
    }
}

/// Renders the innermost aggregation of a bucket.
fn bucket_body(kind: &BucketKind) -> Value {
    match kind {
        BucketKind::Term {
            field,
            size,
            order,
            min_doc_count,
        } => {
            let size = if *size == 0 { UNBOUNDED_BUCKET_SIZE } else { *size };
            let mut terms = json!({ "field": field, "size": size });
            if *min_doc_count != 1 {
                terms["min_doc_count"] = json!(min_doc_count);
            }
            match order {
                BucketOrder::Count => json!({ "terms": terms }),
                BucketOrder::Key => {
                    terms["order"] = json!({ "_key": "asc" });
                    json!({ "terms": terms })
                }
                BucketOrder::Relevance => {
                    terms["order"] = json!({ MAX_SCORE_AGGREGATION: "desc" });
                    json!({
                        "terms": terms,
                        "aggregations": {
                            MAX_SCORE_AGGREGATION: { "max": { "script": "_score" } }
                        },
                    })
                }
            }
        }
        BucketKind::Histogram {
            field,
            interval,
            min_doc_count,
        } => json!({
            "histogram": {
                "field": field,
                "interval": interval,
                "min_doc_count": min_doc_count,
            }
        }),
        BucketKind::QueryGroup { queries } => {
            let filters: Map<String, Value> = queries
                .iter()
                .map(|(key, query)| (key.clone(), query.to_json()))
                .collect();
            json!({ "filters": { "filters": filters } })
        }
    }
}
