//! Normalization of engine responses.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{SearchError, aggregation::INDEXED_ATTRIBUTES_BUCKET};

/// A normalized search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Total number of matching documents.
    pub total: u64,
    /// Best score among the hits.
    pub max_score: Option<f64>,
    /// Hits in engine order.
    pub documents: Vec<Document>,
    /// Bucket counts keyed by bucket name, then bucket key.
    pub aggregations: IndexMap<String, IndexMap<String, u64>>,
}

/// One hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Document id.
    pub id: String,
    /// Relevance score.
    pub score: Option<f64>,
    /// Stored source.
    pub source: Value,
    /// Names of the named clauses the document matched.
    pub matched_queries: Vec<String>,
    /// Highlighted fragments keyed by field.
    pub highlight: IndexMap<String, Vec<String>>,
    /// Inner hits keyed by inner-hits name.
    pub inner_hits: IndexMap<String, Vec<Document>>,
}

/// Maps raw engine responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseMapper;

impl ResponseMapper {
    /// Creates a mapper.
    pub fn new() -> Self {
        Self
    }

    /// Maps a raw search response.
    pub fn map(&self, raw: &Value) -> Result<SearchResponse, SearchError> {
        let hits = raw
            .get("hits")
            .ok_or_else(|| SearchError::response("missing 'hits'"))?;
        let (total, max_score, documents) = read_hits(hits)?;
        let aggregations = match raw.get("aggregations") {
            Some(Value::Object(aggregations)) => self.map_aggregations(aggregations),
            _ => IndexMap::new(),
        };
        debug!(
            total,
            documents = documents.len(),
            aggregations = aggregations.len(),
            "mapped engine response"
        );
        Ok(SearchResponse {
            total,
            max_score,
            documents,
            aggregations,
        })
    }

    /// Maps the aggregations of a response into bucket counts.
    ///
    /// Wrapper levels carrying the bucket's own name are skipped.
    pub fn map_aggregations(
        &self,
        aggregations: &Map<String, Value>,
    ) -> IndexMap<String, IndexMap<String, u64>> {
        aggregations
            .iter()
            .map(|(name, aggregation)| (name.clone(), bucket_counts(name, aggregation)))
            .collect()
    }
}

/// Reads the total, best score and documents of a `hits` object.
fn read_hits(hits: &Value) -> Result<(u64, Option<f64>, Vec<Document>), SearchError> {
    let total = match hits.get("total") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
        None => Some(0),
        Some(_) => None,
    }
    .ok_or_else(|| SearchError::response("unreadable 'hits.total'"))?;

    let max_score = hits.get("max_score").and_then(Value::as_f64);
    let documents = match hits.get("hits") {
        Some(Value::Array(hits)) => hits
            .iter()
            .map(read_document)
            .collect::<Result<Vec<_>, SearchError>>()?,
        None => Vec::new(),
        Some(_) => return Err(SearchError::response("'hits.hits' is not an array")),
    };
    Ok((total, max_score, documents))
}

/// Reads one hit.
fn read_document(hit: &Value) -> Result<Document, SearchError> {
    let id = match hit.get("_id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(SearchError::response("hit without '_id'")),
    };

    let matched_queries: Vec<String> = hit
        .get("matched_queries")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let highlight: IndexMap<String, Vec<String>> = hit
        .get("highlight")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(field, fragments)| {
                    let fragments: Vec<String> = fragments
                        .as_array()
                        .map(|f| f.iter().filter_map(Value::as_str).map(str::to_string).collect())
                        .unwrap_or_default();
                    (field.clone(), fragments)
                })
                .collect()
        })
        .unwrap_or_default();

    let mut inner_hits = IndexMap::new();
    if let Some(Value::Object(groups)) = hit.get("inner_hits") {
        for (name, group) in groups {
            let documents = match group.get("hits") {
                Some(hits) => read_hits(hits)?.2,
                None => Vec::new(),
            };
            inner_hits.insert(name.clone(), documents);
        }
    }

    Ok(Document {
        id,
        score: hit.get("_score").and_then(Value::as_f64),
        source: hit.get("_source").cloned().unwrap_or(Value::Null),
        matched_queries,
        highlight,
        inner_hits,
    })
}

/// Reads the bucket counts of one aggregation, descending through same-named wrappers.
fn bucket_counts(name: &str, aggregation: &Value) -> IndexMap<String, u64> {
    let mut current = aggregation;
    while let Some(inner) = current.get(name).filter(|inner| inner.is_object()) {
        current = inner;
    }

    match current.get("buckets") {
        Some(Value::Array(buckets)) => buckets
            .iter()
            .filter_map(|bucket| {
                let key = bucket
                    .get("key_as_string")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| bucket.get("key").map(bucket_key))?;
                Some((key, doc_count(bucket)))
            })
            .collect(),
        Some(Value::Object(buckets)) => buckets
            .iter()
            .map(|(key, bucket)| (key.clone(), doc_count(bucket)))
            .collect(),
        _ => IndexMap::new(),
    }
}

/// Renders a bucket key as a string; integral numbers lose their fraction.
fn bucket_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Reads the document count of a bucket.
fn doc_count(bucket: &Value) -> u64 {
    bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0)
}

/// Share of matching documents carrying each attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeCoverage {
    /// Number of matching documents.
    total: u64,
    /// Documents carrying each attribute.
    counts: IndexMap<String, u64>,
}

impl AttributeCoverage {
    /// Creates coverage data from a total and per-attribute counts.
    pub fn new(total: u64, counts: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            total,
            counts: counts.into_iter().collect(),
        }
    }

    /// Reads coverage from a response that computed the coverage aggregations.
    pub fn from_response(response: &SearchResponse) -> Self {
        Self {
            total: response.total,
            counts: response
                .aggregations
                .get(INDEXED_ATTRIBUTES_BUCKET)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Returns the percentage of matching documents carrying `attribute`.
    pub fn rate(&self, attribute: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let count = self.counts.get(attribute).copied().unwrap_or(0);
        count as f64 * 100.0 / self.total as f64
    }

    /// Returns the number of matching documents.
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_hits_and_object_total() {
        let raw = json!({
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "max_score": 3.5,
                "hits": [
                    {
                        "_id": "12",
                        "_score": 3.5,
                        "_source": { "name": "Red shoe" },
                        "matched_queries": ["catalog"],
                        "highlight": { "name": ["<em>Red</em> shoe"] }
                    },
                    { "_id": 13, "_score": null }
                ]
            }
        });

        let response = ResponseMapper::new().map(&raw).unwrap();
        assert_eq!(response.total, 42);
        assert_eq!(response.max_score, Some(3.5));
        assert_eq!(response.documents.len(), 2);
        let first = &response.documents[0];
        assert_eq!(first.id, "12");
        assert_eq!(first.matched_queries, ["catalog"]);
        assert_eq!(first.highlight["name"], ["<em>Red</em> shoe"]);
        assert_eq!(response.documents[1].id, "13");
        assert_eq!(response.documents[1].score, None);
        assert_eq!(response.documents[1].source, Value::Null);
    }

    #[test]
    fn legacy_numeric_total() {
        let response = ResponseMapper::new()
            .map(&json!({ "hits": { "total": 7, "hits": [] } }))
            .unwrap();
        assert_eq!(response.total, 7);
    }

    #[test]
    fn missing_id_is_an_error() {
        let err = ResponseMapper::new()
            .map(&json!({ "hits": { "total": 1, "hits": [{ "_score": 1.0 }] } }))
            .unwrap_err();
        assert!(err.to_string().contains("_id"));
    }

    #[test]
    fn missing_hits_is_an_error() {
        assert!(ResponseMapper::new().map(&json!({})).is_err());
    }

    #[test]
    fn dereferences_same_named_wrappers() {
        let raw = json!({
            "hits": { "total": 3, "hits": [] },
            "aggregations": {
                "categories": {
                    "doc_count": 3,
                    "categories": {
                        "doc_count": 5,
                        "categories": {
                            "buckets": [
                                { "key": 4, "doc_count": 2 },
                                { "key": 7.0, "doc_count": 1 }
                            ]
                        }
                    }
                }
            }
        });

        let response = ResponseMapper::new().map(&raw).unwrap();
        let categories = &response.aggregations["categories"];
        assert_eq!(categories["4"], 2);
        assert_eq!(categories["7"], 1);
    }

    #[test]
    fn keyed_buckets_and_key_as_string() {
        let raw = json!({
            "hits": { "total": 3, "hits": [] },
            "aggregations": {
                "stock": { "buckets": { "in_stock": { "doc_count": 2 } } },
                "flag": { "buckets": [{ "key": 1, "key_as_string": "true", "doc_count": 3 }] }
            }
        });
        let response = ResponseMapper::new().map(&raw).unwrap();
        assert_eq!(response.aggregations["stock"]["in_stock"], 2);
        assert_eq!(response.aggregations["flag"]["true"], 3);
    }

    #[test]
    fn inner_hits_are_mapped() {
        let raw = json!({
            "hits": {
                "total": 1,
                "hits": [{
                    "_id": "1",
                    "inner_hits": {
                        "variants": {
                            "hits": { "total": 1, "hits": [{ "_id": "1-a" }] }
                        }
                    }
                }]
            }
        });
        let response = ResponseMapper::new().map(&raw).unwrap();
        assert_eq!(response.documents[0].inner_hits["variants"][0].id, "1-a");
    }

    #[test]
    fn coverage_rates_from_indexed_attributes() {
        let raw = json!({
            "hits": { "total": 200, "hits": [] },
            "aggregations": {
                "indexed_attributes": {
                    "buckets": [
                        { "key": "color", "doc_count": 50 },
                        { "key": "size", "doc_count": 200 }
                    ]
                }
            }
        });
        let response = ResponseMapper::new().map(&raw).unwrap();
        let coverage = AttributeCoverage::from_response(&response);
        assert_eq!(coverage.rate("color"), 25.0);
        assert_eq!(coverage.rate("size"), 100.0);
        assert_eq!(coverage.rate("brand"), 0.0);
        assert_eq!(coverage.total(), 200);
    }

    #[test]
    fn empty_coverage_has_zero_rate() {
        assert_eq!(AttributeCoverage::default().rate("color"), 0.0);
    }
}
