//! Query node types and constructors.
//!
//! [`QueryNode`] is the intermediate representation shared by every builder in the compiler.
//! Nodes are plain immutable values: builders create them, combine them with [`QueryNode::and`]
//! and [`QueryNode::or`], and hand the finished tree to the request mapper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default boost applied when none is given.
pub(crate) const DEFAULT_BOOST: f64 = 1.0;

/// A scalar value compared against a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
}

impl FieldValue {
    /// Reads a value from its literal form: `true`/`false`, an integer, a float, or text.
    pub fn from_literal(literal: &str) -> Self {
        let literal = literal.trim();
        match literal {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => {
                if let Ok(v) = literal.parse::<i64>() {
                    return Self::Integer(v);
                }
                match literal.parse::<f64>() {
                    Ok(v) if v.is_finite() => Self::Float(v),
                    _ => Self::Text(literal.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Integer)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A field reference with a relevance weight, rendered as `field^weight`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedField {
    /// Physical field path.
    pub field: String,
    /// Relevance weight of the field.
    pub weight: f64,
}

impl WeightedField {
    /// Creates a weighted field.
    pub fn new(field: impl Into<String>, weight: f64) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }
}

impl fmt::Display for WeightedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.field, self.weight)
    }
}

/// Fuzzy matching settings attached to a multi-field query.
#[derive(Debug, Clone, PartialEq)]
pub struct Fuzziness {
    /// Edit distance (`AUTO`, `0`, `1` or `2`).
    pub value: String,
    /// Number of leading characters that must match exactly.
    pub prefix_length: u32,
    /// Maximum number of term variants a fuzzy term expands to.
    pub max_expansions: u32,
}

/// Bounds of a range query. At least one bound should be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    /// Strictly greater than.
    pub gt: Option<FieldValue>,
    /// Greater than or equal.
    pub gte: Option<FieldValue>,
    /// Strictly lower than.
    pub lt: Option<FieldValue>,
    /// Lower than or equal.
    pub lte: Option<FieldValue>,
}

impl RangeBounds {
    /// Returns true if no bound is set.
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

/// How the scores of matching nested documents combine into the parent score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreMode {
    /// Average score of the matching nested documents.
    #[default]
    Avg,
    /// Highest score.
    Max,
    /// Lowest score.
    Min,
    /// Sum of scores.
    Sum,
    /// Nested scores are ignored.
    None,
}

impl ScoreMode {
    /// Returns the engine name of the score mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::None => "none",
        }
    }

    /// Parses an engine score mode name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "avg" => Some(Self::Avg),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "sum" | "total" => Some(Self::Sum),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Boolean combination of clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolQuery {
    /// Clauses that must match and contribute to the score.
    pub must: Vec<QueryNode>,
    /// Optional clauses; see `minimum_should_match`.
    pub should: Vec<QueryNode>,
    /// Clauses that must not match.
    pub must_not: Vec<QueryNode>,
    /// Clauses that must match without scoring.
    pub filter: Vec<QueryNode>,
    /// Number or percentage of `should` clauses that must match.
    pub minimum_should_match: Option<String>,
    /// Boost of the whole clause.
    pub boost: f64,
    /// Clause name reported back in matched-query data.
    pub name: Option<String>,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            filter: Vec::new(),
            minimum_should_match: None,
            boost: DEFAULT_BOOST,
            name: None,
        }
    }
}

impl BoolQuery {
    /// Returns true if the query has no clause at all.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Returns true if only `must` clauses are set, with no boost, name or threshold.
    fn is_plain_conjunction(&self) -> bool {
        self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
            && self.minimum_should_match.is_none()
            && self.name.is_none()
            && self.boost == DEFAULT_BOOST
    }

    /// Returns true if only `should` clauses are set with a threshold of one.
    fn is_plain_disjunction(&self) -> bool {
        self.must.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
            && self.minimum_should_match.as_deref() == Some("1")
            && self.name.is_none()
            && self.boost == DEFAULT_BOOST
    }
}

/// A node of the compiled query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Matches every document.
    MatchAll {
        /// Constant score of matching documents.
        boost: f64,
    },

    /// Matches no document.
    MatchNone,

    /// Exact value match on a non-analyzed field.
    Term {
        /// Physical field path.
        field: String,
        /// Value to match.
        value: FieldValue,
        /// Clause boost.
        boost: f64,
    },

    /// Matches any of several exact values.
    Terms {
        /// Physical field path.
        field: String,
        /// Accepted values.
        values: Vec<FieldValue>,
        /// Clause boost.
        boost: f64,
    },

    /// Range comparison.
    Range {
        /// Physical field path.
        field: String,
        /// Range bounds.
        bounds: RangeBounds,
        /// Clause boost.
        boost: f64,
    },

    /// Field has a value.
    Exists {
        /// Physical field path.
        field: String,
        /// Clause boost.
        boost: f64,
    },

    /// Analyzed full-text match on one field.
    Match {
        /// Physical field path.
        field: String,
        /// Query text.
        text: String,
        /// Number or percentage of terms that must match.
        minimum_should_match: Option<String>,
        /// Whether terms must appear as a phrase.
        phrase: bool,
        /// Clause boost.
        boost: f64,
    },

    /// Full-text match across weighted fields.
    MultiMatch {
        /// Weighted fields searched.
        fields: Vec<WeightedField>,
        /// Query text.
        text: String,
        /// Number or percentage of terms that must match.
        minimum_should_match: Option<String>,
        /// Tie breaker between fields.
        tie_breaker: Option<f64>,
        /// Fuzzy matching settings, if active.
        fuzziness: Option<Fuzziness>,
        /// Frequency above which terms are treated as common.
        cutoff_frequency: Option<f64>,
        /// Clause boost.
        boost: f64,
    },

    /// Common-terms query: high-frequency terms only contribute to scoring.
    Common {
        /// Physical field path.
        field: String,
        /// Query text.
        text: String,
        /// Frequency above which terms are treated as common.
        cutoff_frequency: f64,
        /// Number or percentage of low-frequency terms that must match.
        minimum_should_match: Option<String>,
        /// Clause boost.
        boost: f64,
    },

    /// Boolean combination.
    Bool(BoolQuery),

    /// Query scoped to nested documents.
    Nested {
        /// Nested document path.
        path: String,
        /// Query run against the nested documents.
        query: Box<Self>,
        /// How nested scores combine.
        score_mode: ScoreMode,
        /// Clause boost.
        boost: f64,
    },

    /// Negation: documents that do not match the inner query.
    Not {
        /// The excluded query.
        query: Box<Self>,
        /// Clause boost.
        boost: f64,
    },

    /// Scored query restricted by a non-scoring filter.
    Filtered {
        /// Scoring query.
        query: Box<Self>,
        /// Non-scoring filter.
        filter: Box<Self>,
        /// Clause boost.
        boost: f64,
    },
}

impl QueryNode {
    /// Creates a match-all node.
    pub fn match_all() -> Self {
        Self::MatchAll {
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a term node.
    pub fn term(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a terms node.
    pub fn terms(field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self::Terms {
            field: field.into(),
            values,
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a range node.
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Self::Range {
            field: field.into(),
            bounds,
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates an exists node.
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a full-text match node.
    pub fn match_text(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
            minimum_should_match: None,
            phrase: false,
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a phrase match node.
    pub fn phrase(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
            minimum_should_match: None,
            phrase: true,
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a nested node with the default score mode.
    pub fn nested(path: impl Into<String>, query: Self) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
            score_mode: ScoreMode::default(),
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a negation node.
    pub fn not(query: Self) -> Self {
        Self::Not {
            query: Box::new(query),
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a filtered node.
    pub fn filtered(query: Self, filter: Self) -> Self {
        Self::Filtered {
            query: Box::new(query),
            filter: Box::new(filter),
            boost: DEFAULT_BOOST,
        }
    }

    /// Creates a conjunction, flattening plain nested conjunctions.
    ///
    /// An empty list matches everything, a single clause is returned unwrapped, and any
    /// `MatchNone` clause makes the whole conjunction `MatchNone`.
    pub fn and(nodes: Vec<Self>) -> Self {
        let mut flattened = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Self::MatchNone => return Self::MatchNone,
                Self::Bool(inner) if inner.is_plain_conjunction() => {
                    flattened.extend(inner.must);
                }
                other => flattened.push(other),
            }
        }

        match flattened.len() {
            0 => Self::match_all(),
            1 => flattened.remove(0),
            _ => Self::Bool(BoolQuery {
                must: flattened,
                ..BoolQuery::default()
            }),
        }
    }

    /// Creates a disjunction requiring at least one clause, flattening plain nested
    /// disjunctions.
    ///
    /// `MatchNone` clauses are dropped; an empty result is `MatchNone`.
    pub fn or(nodes: Vec<Self>) -> Self {
        let mut flattened = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Self::MatchNone => {}
                Self::Bool(inner) if inner.is_plain_disjunction() => {
                    flattened.extend(inner.should);
                }
                other => flattened.push(other),
            }
        }

        match flattened.len() {
            0 => Self::MatchNone,
            1 => flattened.remove(0),
            _ => Self::Bool(BoolQuery {
                should: flattened,
                minimum_should_match: Some("1".to_string()),
                ..BoolQuery::default()
            }),
        }
    }

    /// Returns the node with its boost replaced. `MatchNone` has no boost and is unchanged.
    pub fn with_boost(mut self, value: f64) -> Self {
        match &mut self {
            Self::MatchNone => {}
            Self::Bool(query) => query.boost = value,
            Self::MatchAll { boost }
            | Self::Term { boost, .. }
            | Self::Terms { boost, .. }
            | Self::Range { boost, .. }
            | Self::Exists { boost, .. }
            | Self::Match { boost, .. }
            | Self::MultiMatch { boost, .. }
            | Self::Common { boost, .. }
            | Self::Nested { boost, .. }
            | Self::Not { boost, .. }
            | Self::Filtered { boost, .. } => *boost = value,
        }
        self
    }

    /// Returns the boost of the node (`1.0` for `MatchNone`).
    pub fn boost(&self) -> f64 {
        match self {
            Self::MatchNone => DEFAULT_BOOST,
            Self::Bool(query) => query.boost,
            Self::MatchAll { boost }
            | Self::Term { boost, .. }
            | Self::Terms { boost, .. }
            | Self::Range { boost, .. }
            | Self::Exists { boost, .. }
            | Self::Match { boost, .. }
            | Self::MultiMatch { boost, .. }
            | Self::Common { boost, .. }
            | Self::Nested { boost, .. }
            | Self::Not { boost, .. }
            | Self::Filtered { boost, .. } => *boost,
        }
    }

    /// Returns the kind of node as a lowercase name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MatchAll { .. } => "match_all",
            Self::MatchNone => "match_none",
            Self::Term { .. } => "term",
            Self::Terms { .. } => "terms",
            Self::Range { .. } => "range",
            Self::Exists { .. } => "exists",
            Self::Match { phrase: true, .. } => "match_phrase",
            Self::Match { .. } => "match",
            Self::MultiMatch { .. } => "multi_match",
            Self::Common { .. } => "common",
            Self::Bool(_) => "bool",
            Self::Nested { .. } => "nested",
            Self::Not { .. } => "not",
            Self::Filtered { .. } => "filtered",
        }
    }

    /// Returns true for the `MatchNone` node.
    pub fn is_match_none(&self) -> bool {
        matches!(self, Self::MatchNone)
    }

    /// Returns the direct children of the node.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Bool(query) => query
                .must
                .iter()
                .chain(&query.should)
                .chain(&query.must_not)
                .chain(&query.filter)
                .collect(),
            Self::Nested { query, .. } | Self::Not { query, .. } => vec![query.as_ref()],
            Self::Filtered { query, filter, .. } => vec![query.as_ref(), filter.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Returns the fields referenced directly by this node (not its children).
    pub fn own_fields(&self) -> Vec<&str> {
        match self {
            Self::Term { field, .. }
            | Self::Terms { field, .. }
            | Self::Range { field, .. }
            | Self::Exists { field, .. }
            | Self::Match { field, .. }
            | Self::Common { field, .. } => vec![field.as_str()],
            Self::MultiMatch { fields, .. } => fields.iter().map(|f| f.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns every field referenced anywhere in the tree, in depth-first order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = self.own_fields();
        for child in self.children() {
            fields.extend(child.fields());
        }
        fields
    }

    /// Returns true if any node in the tree satisfies the predicate.
    pub fn any(&self, predicate: &dyn Fn(&Self) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|c| c.any(predicate))
    }

    /// Returns the depth of the tree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Self::depth)
            .max()
            .unwrap_or(0)
    }

    /// Formats the node as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        let boost = fmt_boost(self.boost());
        match self {
            Self::MatchAll { .. } => writeln!(f, "{prefix}MatchAll{boost}"),
            Self::MatchNone => writeln!(f, "{prefix}MatchNone"),
            Self::Term { field, value, .. } => {
                writeln!(f, "{prefix}Term({field} = {value}){boost}")
            }
            Self::Terms { field, values, .. } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                writeln!(f, "{prefix}Terms({field} in [{}]){boost}", values.join(", "))
            }
            Self::Range { field, bounds, .. } => {
                writeln!(f, "{prefix}Range({field} {}){boost}", fmt_bounds(bounds))
            }
            Self::Exists { field, .. } => writeln!(f, "{prefix}Exists({field}){boost}"),
            Self::Match {
                field,
                text,
                phrase,
                minimum_should_match,
                ..
            } => {
                let name = if *phrase { "MatchPhrase" } else { "Match" };
                let msm = fmt_msm(minimum_should_match.as_deref());
                writeln!(f, "{prefix}{name}({field}: {text:?}{msm}){boost}")
            }
            Self::MultiMatch {
                fields,
                text,
                minimum_should_match,
                fuzziness,
                ..
            } => {
                let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
                let msm = fmt_msm(minimum_should_match.as_deref());
                let fuzzy = fuzziness
                    .as_ref()
                    .map(|fz| format!(", fuzziness={}", fz.value))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "{prefix}MultiMatch([{}]: {text:?}{msm}{fuzzy}){boost}",
                    fields.join(", ")
                )
            }
            Self::Common {
                field,
                text,
                cutoff_frequency,
                ..
            } => writeln!(
                f,
                "{prefix}Common({field}: {text:?}, cutoff={cutoff_frequency}){boost}"
            ),
            Self::Bool(query) => {
                let name = query
                    .name
                    .as_ref()
                    .map(|n| format!(" [{n}]"))
                    .unwrap_or_default();
                let msm = fmt_msm(query.minimum_should_match.as_deref());
                writeln!(f, "{prefix}Bool{name}{boost}{msm}")?;
                let sections = [
                    ("must", &query.must),
                    ("should", &query.should),
                    ("must_not", &query.must_not),
                    ("filter", &query.filter),
                ];
                for (label, clauses) in sections {
                    if clauses.is_empty() {
                        continue;
                    }
                    writeln!(f, "{prefix}  {label}:")?;
                    for clause in clauses {
                        clause.fmt_tree(f, indent + 2)?;
                    }
                }
                Ok(())
            }
            Self::Nested {
                path,
                query,
                score_mode,
                ..
            } => {
                writeln!(f, "{prefix}Nested({path}, {}){boost}", score_mode.as_str())?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Not { query, .. } => {
                writeln!(f, "{prefix}Not{boost}")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Filtered { query, filter, .. } => {
                writeln!(f, "{prefix}Filtered{boost}")?;
                writeln!(f, "{prefix}  query:")?;
                query.fmt_tree(f, indent + 2)?;
                writeln!(f, "{prefix}  filter:")?;
                filter.fmt_tree(f, indent + 2)
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Formats a boost suffix, omitted for the default boost.
fn fmt_boost(boost: f64) -> String {
    if boost == DEFAULT_BOOST {
        String::new()
    } else {
        format!("^{boost}")
    }
}

/// Formats a minimum-should-match suffix.
fn fmt_msm(msm: Option<&str>) -> String {
    msm.map(|m| format!(", msm={m}")).unwrap_or_default()
}

/// Formats range bounds as comparison operators.
fn fmt_bounds(bounds: &RangeBounds) -> String {
    let parts: Vec<String> = [
        (">", &bounds.gt),
        (">=", &bounds.gte),
        ("<", &bounds.lt),
        ("<=", &bounds.lte),
    ]
    .into_iter()
    .filter_map(|(op, value)| value.as_ref().map(|v| format!("{op} {v}")))
    .collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_plain_conjunctions() {
        let nested = QueryNode::and(vec![
            QueryNode::term("a", 1),
            QueryNode::and(vec![QueryNode::term("b", 2), QueryNode::term("c", 3)]),
        ]);

        let QueryNode::Bool(query) = nested else {
            panic!("expected bool");
        };
        assert_eq!(query.must.len(), 3);
    }

    #[test]
    fn and_keeps_boosted_conjunctions() {
        let inner =
            QueryNode::and(vec![QueryNode::term("b", 2), QueryNode::term("c", 3)]).with_boost(2.0);
        let outer = QueryNode::and(vec![QueryNode::term("a", 1), inner]);

        let QueryNode::Bool(query) = outer else {
            panic!("expected bool");
        };
        assert_eq!(query.must.len(), 2);
    }

    #[test]
    fn and_single_element_unwraps() {
        let single = QueryNode::and(vec![QueryNode::term("a", 1)]);
        assert_eq!(single, QueryNode::term("a", 1));
    }

    #[test]
    fn and_with_match_none_matches_nothing() {
        let q = QueryNode::and(vec![QueryNode::term("a", 1), QueryNode::MatchNone]);
        assert!(q.is_match_none());
    }

    #[test]
    fn empty_and_matches_everything() {
        assert_eq!(QueryNode::and(vec![]), QueryNode::match_all());
    }

    #[test]
    fn or_drops_match_none() {
        let q = QueryNode::or(vec![QueryNode::MatchNone, QueryNode::term("a", 1)]);
        assert_eq!(q, QueryNode::term("a", 1));
    }

    #[test]
    fn or_of_nothing_matches_nothing() {
        assert!(QueryNode::or(vec![QueryNode::MatchNone]).is_match_none());
        assert!(QueryNode::or(vec![]).is_match_none());
    }

    #[test]
    fn or_sets_minimum_should_match() {
        let q = QueryNode::or(vec![QueryNode::term("a", 1), QueryNode::term("b", 2)]);
        let QueryNode::Bool(query) = q else {
            panic!("expected bool");
        };
        assert_eq!(query.should.len(), 2);
        assert_eq!(query.minimum_should_match.as_deref(), Some("1"));
    }

    #[test]
    fn with_boost_on_match_none_is_noop() {
        assert_eq!(QueryNode::MatchNone.with_boost(3.0), QueryNode::MatchNone);
    }

    #[test]
    fn fields_are_collected_depth_first() {
        let q = QueryNode::and(vec![
            QueryNode::term("color", "red"),
            QueryNode::nested("category", QueryNode::term("category.category_id", 3)),
        ]);
        assert_eq!(q.fields(), vec!["color", "category.category_id"]);
    }

    #[test]
    fn depth_counts_levels() {
        assert_eq!(QueryNode::term("a", 1).depth(), 1);
        let q = QueryNode::not(QueryNode::nested("p", QueryNode::term("p.a", 1)));
        assert_eq!(q.depth(), 3);
    }

    #[test]
    fn display_renders_tree() {
        let q = QueryNode::and(vec![
            QueryNode::term("color", "red"),
            QueryNode::match_text("name", "shoe").with_boost(2.0),
        ]);
        let rendered = q.to_string();
        assert!(rendered.starts_with("Bool\n"));
        assert!(rendered.contains("  must:\n"));
        assert!(rendered.contains("Term(color = red)"));
        assert!(rendered.contains("Match(name: \"shoe\")^2"));
    }

    #[test]
    fn field_value_from_large_u64_degrades_to_float() {
        assert_eq!(FieldValue::from(3_u64), FieldValue::Integer(3));
        assert!(matches!(FieldValue::from(u64::MAX), FieldValue::Float(_)));
    }

    #[test]
    fn field_value_from_literal() {
        assert_eq!(FieldValue::from_literal("true"), FieldValue::Bool(true));
        assert_eq!(FieldValue::from_literal(" 42 "), FieldValue::Integer(42));
        assert_eq!(FieldValue::from_literal("4.5"), FieldValue::Float(4.5));
        assert_eq!(FieldValue::from_literal("NaN"), FieldValue::Text("NaN".into()));
        assert_eq!(FieldValue::from_literal("red"), FieldValue::Text("red".into()));
    }
}
