//! Rendering of query trees to engine-native JSON.

use serde_json::{Map, Value, json};

use crate::node::{BoolQuery, DEFAULT_BOOST, FieldValue, QueryNode, RangeBounds};

impl QueryNode {
    /// Renders the node as an engine query DSL document.
    ///
    /// Boosts equal to `1.0` are omitted. `Not` renders as a `bool` with a single
    /// `must_not` clause and `Filtered` as a `bool` with `must` and `filter` clauses.
    pub fn to_json(&self) -> Value {
        match self {
            Self::MatchAll { boost } => {
                let mut body = Map::new();
                insert_boost(&mut body, *boost);
                json!({ "match_all": body })
            }
            Self::MatchNone => json!({ "match_none": {} }),
            Self::Term {
                field,
                value,
                boost,
            } => {
                let value = field_value(value);
                if *boost == DEFAULT_BOOST {
                    json!({ "term": { field.clone(): value } })
                } else {
                    json!({ "term": { field.clone(): { "value": value, "boost": boost } } })
                }
            }
            Self::Terms {
                field,
                values,
                boost,
            } => {
                let mut body = Map::new();
                body.insert(
                    field.clone(),
                    Value::Array(values.iter().map(field_value).collect()),
                );
                insert_boost(&mut body, *boost);
                json!({ "terms": body })
            }
            Self::Range {
                field,
                bounds,
                boost,
            } => {
                let mut body = range_bounds(bounds);
                insert_boost(&mut body, *boost);
                json!({ "range": { field.clone(): body } })
            }
            Self::Exists { field, boost } => {
                let mut body = Map::new();
                body.insert("field".into(), Value::String(field.clone()));
                insert_boost(&mut body, *boost);
                json!({ "exists": body })
            }
            Self::Match {
                field,
                text,
                minimum_should_match,
                phrase,
                boost,
            } => {
                let mut body = Map::new();
                body.insert("query".into(), Value::String(text.clone()));
                if let Some(msm) = minimum_should_match
                    && !phrase
                {
                    body.insert("minimum_should_match".into(), Value::String(msm.clone()));
                }
                insert_boost(&mut body, *boost);
                let key = if *phrase { "match_phrase" } else { "match" };
                json!({ key: { field.clone(): body } })
            }
            Self::MultiMatch {
                fields,
                text,
                minimum_should_match,
                tie_breaker,
                fuzziness,
                cutoff_frequency,
                boost,
            } => {
                let mut body = Map::new();
                body.insert("query".into(), Value::String(text.clone()));
                body.insert(
                    "fields".into(),
                    Value::Array(
                        fields
                            .iter()
                            .map(|f| Value::String(f.to_string()))
                            .collect(),
                    ),
                );
                if let Some(msm) = minimum_should_match {
                    body.insert("minimum_should_match".into(), Value::String(msm.clone()));
                }
                if let Some(tie_breaker) = tie_breaker {
                    body.insert("tie_breaker".into(), json!(tie_breaker));
                }
                if let Some(fuzziness) = fuzziness {
                    body.insert("fuzziness".into(), Value::String(fuzziness.value.clone()));
                    body.insert("prefix_length".into(), json!(fuzziness.prefix_length));
                    body.insert("max_expansions".into(), json!(fuzziness.max_expansions));
                }
                if let Some(cutoff) = cutoff_frequency {
                    body.insert("cutoff_frequency".into(), json!(cutoff));
                }
                insert_boost(&mut body, *boost);
                json!({ "multi_match": body })
            }
            Self::Common {
                field,
                text,
                cutoff_frequency,
                minimum_should_match,
                boost,
            } => {
                let mut body = Map::new();
                body.insert("query".into(), Value::String(text.clone()));
                body.insert("cutoff_frequency".into(), json!(cutoff_frequency));
                if let Some(msm) = minimum_should_match {
                    body.insert(
                        "minimum_should_match".into(),
                        json!({ "low_freq": msm }),
                    );
                }
                insert_boost(&mut body, *boost);
                json!({ "common": { field.clone(): body } })
            }
            Self::Bool(query) => render_bool(query),
            Self::Nested {
                path,
                query,
                score_mode,
                boost,
            } => {
                let mut body = Map::new();
                body.insert("path".into(), Value::String(path.clone()));
                body.insert("score_mode".into(), Value::String(score_mode.as_str().into()));
                body.insert("query".into(), query.to_json());
                insert_boost(&mut body, *boost);
                json!({ "nested": body })
            }
            Self::Not { query, boost } => {
                let mut body = Map::new();
                body.insert("must_not".into(), json!([query.to_json()]));
                insert_boost(&mut body, *boost);
                json!({ "bool": body })
            }
            Self::Filtered {
                query,
                filter,
                boost,
            } => {
                let mut body = Map::new();
                body.insert("must".into(), json!([query.to_json()]));
                body.insert("filter".into(), json!([filter.to_json()]));
                insert_boost(&mut body, *boost);
                json!({ "bool": body })
            }
        }
    }
}

/// Renders a boolean query, omitting empty clause lists.
fn render_bool(query: &BoolQuery) -> Value {
    let mut body = Map::new();
    let sections = [
        ("must", &query.must),
        ("should", &query.should),
        ("must_not", &query.must_not),
        ("filter", &query.filter),
    ];
    for (key, clauses) in sections {
        if !clauses.is_empty() {
            body.insert(
                key.into(),
                Value::Array(clauses.iter().map(QueryNode::to_json).collect()),
            );
        }
    }
    if let Some(msm) = &query.minimum_should_match {
        let value = msm
            .parse::<i64>()
            .map_or_else(|_| Value::String(msm.clone()), Value::from);
        body.insert("minimum_should_match".into(), value);
    }
    if let Some(name) = &query.name {
        body.insert("_name".into(), Value::String(name.clone()));
    }
    insert_boost(&mut body, query.boost);
    json!({ "bool": body })
}

/// Renders range bounds as `gt`/`gte`/`lt`/`lte` keys.
fn range_bounds(bounds: &RangeBounds) -> Map<String, Value> {
    let mut body = Map::new();
    for (key, value) in [
        ("gt", &bounds.gt),
        ("gte", &bounds.gte),
        ("lt", &bounds.lt),
        ("lte", &bounds.lte),
    ] {
        if let Some(value) = value {
            body.insert(key.into(), field_value(value));
        }
    }
    body
}

/// Converts a field value to JSON.
pub(crate) fn field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::Integer(v) => Value::from(*v),
        FieldValue::Float(v) => json!(v),
        FieldValue::Text(v) => Value::String(v.clone()),
    }
}

/// Inserts a `boost` key unless the boost is the default.
fn insert_boost(body: &mut Map<String, Value>, boost: f64) {
    if boost != DEFAULT_BOOST {
        body.insert("boost".into(), json!(boost));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fuzziness, WeightedField};

    #[test]
    fn term_renders_value_object() {
        let q = QueryNode::term("sku", "ABC").with_boost(2.0);
        assert_eq!(
            q.to_json(),
            json!({ "term": { "sku": { "value": "ABC", "boost": 2.0 } } })
        );
    }

    #[test]
    fn default_boost_term_is_short() {
        let q = QueryNode::term("sku", "ABC");
        assert_eq!(q.to_json(), json!({ "term": { "sku": "ABC" } }));
    }

    #[test]
    fn multi_match_renders_weighted_fields() {
        let q = QueryNode::MultiMatch {
            fields: vec![WeightedField::new("name", 3.0), WeightedField::new("sku", 1.0)],
            text: "red shoes".into(),
            minimum_should_match: Some("100%".into()),
            tie_breaker: Some(1.0),
            fuzziness: Some(Fuzziness {
                value: "AUTO".into(),
                prefix_length: 1,
                max_expansions: 10,
            }),
            cutoff_frequency: None,
            boost: 1.0,
        };
        let rendered = q.to_json();
        assert_eq!(rendered["multi_match"]["fields"], json!(["name^3", "sku^1"]));
        assert_eq!(rendered["multi_match"]["fuzziness"], json!("AUTO"));
        assert_eq!(rendered["multi_match"]["prefix_length"], json!(1));
        assert!(rendered["multi_match"].get("cutoff_frequency").is_none());
    }

    #[test]
    fn phrase_renders_match_phrase() {
        let q = QueryNode::phrase("search.shingle", "red shoes").with_boost(10.0);
        assert_eq!(
            q.to_json(),
            json!({ "match_phrase": { "search.shingle": { "query": "red shoes", "boost": 10.0 } } })
        );
    }

    #[test]
    fn bool_omits_empty_sections() {
        let q = QueryNode::or(vec![QueryNode::term("a", 1), QueryNode::term("b", 2)]);
        let rendered = q.to_json();
        let body = rendered["bool"].as_object().unwrap();
        assert!(body.contains_key("should"));
        assert!(!body.contains_key("must"));
        assert_eq!(body["minimum_should_match"], json!(1));
    }

    #[test]
    fn bool_renders_percentage_threshold_as_string() {
        let q = QueryNode::Bool(BoolQuery {
            should: vec![QueryNode::term("a", 1)],
            minimum_should_match: Some("75%".into()),
            name: Some("catalog".into()),
            ..BoolQuery::default()
        });
        let rendered = q.to_json();
        assert_eq!(rendered["bool"]["minimum_should_match"], json!("75%"));
        assert_eq!(rendered["bool"]["_name"], json!("catalog"));
    }

    #[test]
    fn not_renders_must_not() {
        let q = QueryNode::not(QueryNode::term("a", 1));
        assert_eq!(
            q.to_json(),
            json!({ "bool": { "must_not": [ { "term": { "a": 1 } } ] } })
        );
    }

    #[test]
    fn filtered_renders_must_and_filter() {
        let q = QueryNode::filtered(QueryNode::match_all(), QueryNode::exists("price.price"));
        let rendered = q.to_json();
        assert_eq!(rendered["bool"]["must"][0], json!({ "match_all": {} }));
        assert_eq!(
            rendered["bool"]["filter"][0],
            json!({ "exists": { "field": "price.price" } })
        );
    }

    #[test]
    fn nested_renders_path_and_score_mode() {
        let q = QueryNode::nested("category", QueryNode::term("category.category_id", 3));
        let rendered = q.to_json();
        assert_eq!(rendered["nested"]["path"], json!("category"));
        assert_eq!(rendered["nested"]["score_mode"], json!("avg"));
    }

    #[test]
    fn common_renders_low_freq_threshold() {
        let q = QueryNode::Common {
            field: "search".into(),
            text: "the red shoes".into(),
            cutoff_frequency: 0.1,
            minimum_should_match: Some("100%".into()),
            boost: 1.0,
        };
        let rendered = q.to_json();
        assert_eq!(rendered["common"]["search"]["cutoff_frequency"], json!(0.1));
        assert_eq!(
            rendered["common"]["search"]["minimum_should_match"]["low_freq"],
            json!("100%")
        );
    }
}
