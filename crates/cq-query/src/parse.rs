//! Parsing of engine-native JSON back into query trees.
//!
//! Accepts the DSL produced by [`QueryNode::to_json`] plus the common shorthand forms
//! (`{"term": {"field": value}}`, `{"match": {"field": "text"}}`, single clauses instead of
//! clause arrays).

use serde_json::{Map, Value};

use crate::{
    QueryError,
    node::{
        BoolQuery, DEFAULT_BOOST, FieldValue, Fuzziness, QueryNode, RangeBounds, ScoreMode,
        WeightedField,
    },
};

impl QueryNode {
    /// Parses an engine query DSL document.
    pub fn from_json(value: &Value) -> Result<Self, QueryError> {
        let object = value
            .as_object()
            .ok_or_else(|| QueryError::parse("query must be a JSON object"))?;
        let mut entries = object.iter();
        let (Some((kind, body)), None) = (entries.next(), entries.next()) else {
            return Err(QueryError::parse(
                "query object must have exactly one key naming the query type",
            ));
        };

        match kind.as_str() {
            "match_all" => Ok(Self::MatchAll {
                boost: boost_of(body)?,
            }),
            "match_none" => Ok(Self::MatchNone),
            "term" => parse_term(body),
            "terms" => parse_terms(body),
            "range" => parse_range(body),
            "exists" => parse_exists(body),
            "match" => parse_match(body, false),
            "match_phrase" => parse_match(body, true),
            "multi_match" => parse_multi_match(body),
            "common" => parse_common(body),
            "bool" => parse_bool(body),
            "nested" => parse_nested(body),
            other => Err(QueryError::parse(format!("unsupported query type '{other}'"))),
        }
    }
}

/// Returns the single `field: body` entry of a field-keyed query.
fn single_field<'a>(kind: &str, body: &'a Value) -> Result<(&'a String, &'a Value), QueryError> {
    let object = as_object(kind, body)?;
    let mut fields = object.iter().filter(|(key, _)| key.as_str() != "boost");
    match (fields.next(), fields.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(QueryError::parse(format!(
            "{kind} query must target exactly one field"
        ))),
    }
}

/// Returns the body as an object or a descriptive error.
fn as_object<'a>(kind: &str, body: &'a Value) -> Result<&'a Map<String, Value>, QueryError> {
    body.as_object()
        .ok_or_else(|| QueryError::parse(format!("{kind} query body must be an object")))
}

/// Reads an optional `boost` key, defaulting to `1.0`.
fn boost_of(body: &Value) -> Result<f64, QueryError> {
    match body.get("boost") {
        None => Ok(DEFAULT_BOOST),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| QueryError::parse("boost must be a number")),
    }
}

/// Converts a JSON scalar to a field value.
fn field_value(value: &Value) -> Result<FieldValue, QueryError> {
    match value {
        Value::Bool(v) => Ok(FieldValue::Bool(*v)),
        Value::Number(n) => Ok(n
            .as_i64()
            .map_or_else(|| FieldValue::Float(n.as_f64().unwrap_or_default()), FieldValue::Integer)),
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        other => Err(QueryError::parse(format!("unsupported field value {other}"))),
    }
}

/// Reads a minimum-should-match value that may be a number or a string.
fn minimum_should_match(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("low_freq").and_then(|v| minimum_should_match(Some(v))),
        _ => None,
    }
}

/// Parses `{"term": {"field": {"value": v, "boost": b}}}` or `{"term": {"field": v}}`.
fn parse_term(body: &Value) -> Result<QueryNode, QueryError> {
    let (field, inner) = single_field("term", body)?;
    let (value, boost) = match inner {
        Value::Object(map) => {
            let value = map
                .get("value")
                .ok_or_else(|| QueryError::parse("term query is missing 'value'"))?;
            (field_value(value)?, boost_of(inner)?)
        }
        scalar => (field_value(scalar)?, DEFAULT_BOOST),
    };
    Ok(QueryNode::Term {
        field: field.clone(),
        value,
        boost,
    })
}

/// Parses `{"terms": {"field": [..], "boost": b}}`.
fn parse_terms(body: &Value) -> Result<QueryNode, QueryError> {
    let (field, values) = single_field("terms", body)?;
    let values = values
        .as_array()
        .ok_or_else(|| QueryError::parse("terms query values must be an array"))?
        .iter()
        .map(field_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QueryNode::Terms {
        field: field.clone(),
        values,
        boost: boost_of(body)?,
    })
}

/// Parses `{"range": {"field": {"gte": .., "lt": ..}}}`.
fn parse_range(body: &Value) -> Result<QueryNode, QueryError> {
    let (field, inner) = single_field("range", body)?;
    let bound = |key: &str| inner.get(key).map(field_value).transpose();
    let bounds = RangeBounds {
        gt: bound("gt")?,
        gte: bound("gte")?,
        lt: bound("lt")?,
        lte: bound("lte")?,
    };
    Ok(QueryNode::Range {
        field: field.clone(),
        bounds,
        boost: boost_of(inner)?,
    })
}

/// Parses `{"exists": {"field": "name"}}`.
fn parse_exists(body: &Value) -> Result<QueryNode, QueryError> {
    let field = body
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::parse("exists query is missing 'field'"))?;
    Ok(QueryNode::Exists {
        field: field.to_string(),
        boost: boost_of(body)?,
    })
}

/// Parses `match` and `match_phrase` queries in object or shorthand form.
fn parse_match(body: &Value, phrase: bool) -> Result<QueryNode, QueryError> {
    let kind = if phrase { "match_phrase" } else { "match" };
    let (field, inner) = single_field(kind, body)?;
    let (text, msm, boost) = match inner {
        Value::String(text) => (text.clone(), None, DEFAULT_BOOST),
        Value::Object(map) => {
            let text = map
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| QueryError::parse(format!("{kind} query is missing 'query'")))?;
            (
                text.to_string(),
                minimum_should_match(map.get("minimum_should_match")),
                boost_of(inner)?,
            )
        }
        _ => return Err(QueryError::parse(format!("invalid {kind} query body"))),
    };
    Ok(QueryNode::Match {
        field: field.clone(),
        text,
        minimum_should_match: msm,
        phrase,
        boost,
    })
}

/// Parses a `multi_match` query with `field^weight` field entries.
fn parse_multi_match(body: &Value) -> Result<QueryNode, QueryError> {
    let map = as_object("multi_match", body)?;
    let text = map
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::parse("multi_match query is missing 'query'"))?;
    let fields = map
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| QueryError::parse("multi_match query is missing 'fields'"))?
        .iter()
        .map(|field| {
            field
                .as_str()
                .map(parse_weighted_field)
                .ok_or_else(|| QueryError::parse("multi_match fields must be strings"))?
        })
        .collect::<Result<Vec<_>, _>>()?;
    let fuzziness = map.get("fuzziness").map(|value| Fuzziness {
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        prefix_length: read_u32(map.get("prefix_length")),
        max_expansions: read_u32(map.get("max_expansions")),
    });
    Ok(QueryNode::MultiMatch {
        fields,
        text: text.to_string(),
        minimum_should_match: minimum_should_match(map.get("minimum_should_match")),
        tie_breaker: map.get("tie_breaker").and_then(Value::as_f64),
        fuzziness,
        cutoff_frequency: map.get("cutoff_frequency").and_then(Value::as_f64),
        boost: boost_of(body)?,
    })
}

/// Reads an optional unsigned integer, defaulting to zero.
fn read_u32(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default()
}

/// Parses `field^weight` (weight defaults to `1`).
fn parse_weighted_field(raw: &str) -> Result<WeightedField, QueryError> {
    match raw.rsplit_once('^') {
        Some((field, weight)) => {
            let weight = weight
                .parse::<f64>()
                .map_err(|_| QueryError::parse(format!("invalid field weight in '{raw}'")))?;
            Ok(WeightedField::new(field, weight))
        }
        None => Ok(WeightedField::new(raw, DEFAULT_BOOST)),
    }
}

/// Parses `{"common": {"field": {"query": .., "cutoff_frequency": ..}}}`.
fn parse_common(body: &Value) -> Result<QueryNode, QueryError> {
    let (field, inner) = single_field("common", body)?;
    let text = inner
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::parse("common query is missing 'query'"))?;
    let cutoff_frequency = inner
        .get("cutoff_frequency")
        .and_then(Value::as_f64)
        .ok_or_else(|| QueryError::parse("common query is missing 'cutoff_frequency'"))?;
    Ok(QueryNode::Common {
        field: field.clone(),
        text: text.to_string(),
        cutoff_frequency,
        minimum_should_match: minimum_should_match(inner.get("minimum_should_match")),
        boost: boost_of(inner)?,
    })
}

/// Parses a `bool` query; each clause section may be an array or a single query.
fn parse_bool(body: &Value) -> Result<QueryNode, QueryError> {
    let map = as_object("bool", body)?;
    let clauses = |key: &str| -> Result<Vec<QueryNode>, QueryError> {
        match map.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(QueryNode::from_json).collect(),
            Some(single) => Ok(vec![QueryNode::from_json(single)?]),
        }
    };
    Ok(QueryNode::Bool(BoolQuery {
        must: clauses("must")?,
        should: clauses("should")?,
        must_not: clauses("must_not")?,
        filter: clauses("filter")?,
        minimum_should_match: minimum_should_match(map.get("minimum_should_match")),
        boost: boost_of(body)?,
        name: map.get("_name").and_then(Value::as_str).map(str::to_string),
    }))
}

/// Parses a `nested` query.
fn parse_nested(body: &Value) -> Result<QueryNode, QueryError> {
    let map = as_object("nested", body)?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::parse("nested query is missing 'path'"))?;
    let query = map
        .get("query")
        .ok_or_else(|| QueryError::parse("nested query is missing 'query'"))?;
    let score_mode = match map.get("score_mode").and_then(Value::as_str) {
        None => ScoreMode::default(),
        Some(name) => ScoreMode::from_name(name)
            .ok_or_else(|| QueryError::parse(format!("unknown score mode '{name}'")))?,
    };
    Ok(QueryNode::Nested {
        path: path.to_string(),
        query: Box::new(QueryNode::from_json(query)?),
        score_mode,
        boost: boost_of(body)?,
    })
}
