//! Full-text query construction.
//!
//! A query is compiled into a named disjunction of branches. The exact branch always exists;
//! fuzzy and phonetic branches are added when the spelling calls for them and the container
//! enables them. An extra branch is the same composition compiled recursively one level deeper
//! with exact spelling, over its own field set, and carries a decayed boost so exact matches
//! always rank first.
//!
//! ```text
//! bool(should, name = container, boost)
//! ├── exact:    filtered(bool(should: multi_match, phrase), common)
//! ├── fuzzy:    bool(should: filtered(bool(should: multi_match(*.whitespace, fuzziness), phrase), common))^decay
//! └── phonetic: bool(should: filtered(bool(should: multi_match(*.phonetic), phrase), common))^decay²
//! ```

use cq_config::{Analyzer, ContainerConfig, FieldDefinition, RelevanceConfig};
use cq_query::{BoolQuery, Fuzziness, QueryNode, WeightedField};
use tracing::debug;

use crate::spellcheck::{Spelling, SpellingType};

/// Minimum should match used when every term must be present.
const ALL_TERMS: &str = "100%";

/// Field variant a branch searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    /// Searchable fields at their weights.
    Exact,
    /// Whitespace sub-fields of spellcheck fields, with fuzziness.
    Fuzzy,
    /// Phonetic sub-fields of spellcheck fields.
    Phonetic,
}

impl Variant {
    /// Suffix appended to the container name to name the branch.
    fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Phonetic => "phonetic",
        }
    }
}

/// Builds full-text query trees for a container.
#[derive(Debug, Clone, Copy, Default)]
pub struct FulltextQueryBuilder;

impl FulltextQueryBuilder {
    /// Creates a builder.
    pub fn new() -> Self {
        Self
    }

    /// Compiles `text` into a query tree.
    ///
    /// `depth` is the recursion level of the call; fuzzy and phonetic expansion only happens
    /// while it is below the container's `max_depth`.
    pub fn build(
        &self,
        container: &ContainerConfig,
        text: &str,
        spelling: SpellingType,
        boost: f64,
        depth: usize,
    ) -> QueryNode {
        let text = text.trim();
        if text.is_empty() {
            return QueryNode::MatchAll { boost };
        }

        let branches = if spelling == SpellingType::PureStopwords {
            vec![stopwords_query(container, text)]
        } else {
            self.branches(container, text, spelling, Variant::Exact, depth)
        };

        debug!(
            container = %container.name,
            %spelling,
            depth,
            branches = branches.len(),
            "built fulltext query"
        );
        named_disjunction(branches, boost, container.name.clone())
    }

    /// Compiles several candidate texts and matches any of them.
    pub fn build_many<S: AsRef<str>>(
        &self,
        container: &ContainerConfig,
        texts: &[S],
        spelling: SpellingType,
        boost: f64,
    ) -> QueryNode {
        let queries: Vec<QueryNode> = texts
            .iter()
            .map(|text| text.as_ref())
            .filter(|text| !text.trim().is_empty())
            .map(|text| self.build(container, text, spelling, boost, 0))
            .collect();
        if queries.is_empty() {
            return QueryNode::MatchAll { boost };
        }
        QueryNode::or(queries)
    }

    /// Compiles `text` together with the spellchecker's correction, if any.
    pub fn build_with_spelling(
        &self,
        container: &ContainerConfig,
        text: &str,
        spelling: &Spelling,
        boost: f64,
    ) -> QueryNode {
        match spelling.corrected {
            Some(ref corrected) if corrected.trim() != text.trim() => {
                self.build_many(container, &[text, corrected.as_str()], spelling.kind, boost)
            }
            _ => self.build(container, text, spelling.kind, boost, 0),
        }
    }

    /// Builds the branches of `variant` at `depth`: its own composition, then the fuzzy and
    /// phonetic expansions the spelling allows.
    fn branches(
        &self,
        container: &ContainerConfig,
        text: &str,
        spelling: SpellingType,
        variant: Variant,
        depth: usize,
    ) -> Vec<QueryNode> {
        let relevance = &container.relevance;
        let mut branches = vec![composed_branch(container, text, variant)];
        if spelling.is_fuzzy() && depth < relevance.max_depth {
            if relevance.is_fuzziness_enabled() {
                branches.push(self.expansion(
                    container,
                    text,
                    Variant::Fuzzy,
                    branch_boost(relevance, depth + 1),
                    depth + 1,
                ));
            }
            if relevance.is_phonetic_enabled() {
                branches.push(self.expansion(
                    container,
                    text,
                    Variant::Phonetic,
                    branch_boost(relevance, depth + 2),
                    depth + 1,
                ));
            }
        }
        branches
    }

    /// Builds a fuzzy or phonetic branch one level down.
    ///
    /// The branch is compiled with exact spelling, so it never expands again.
    fn expansion(
        &self,
        container: &ContainerConfig,
        text: &str,
        variant: Variant,
        boost: f64,
        depth: usize,
    ) -> QueryNode {
        debug!(variant = variant.label(), depth, boost, "adding fulltext branch");
        let branches = self.branches(container, text, SpellingType::Exact, variant, depth);
        named_disjunction(
            branches,
            boost,
            format!("{}.{}", container.name, variant.label()),
        )
    }
}

/// Relative boost of a branch at `level` below the root.
fn branch_boost(relevance: &RelevanceConfig, level: usize) -> f64 {
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    relevance.fuzzy_boost_decay.powi(exponent)
}

/// Wraps branches in a named disjunction requiring one match.
fn named_disjunction(should: Vec<QueryNode>, boost: f64, name: String) -> QueryNode {
    QueryNode::Bool(BoolQuery {
        should,
        minimum_should_match: Some("1".to_string()),
        boost,
        name: Some(name),
        ..BoolQuery::default()
    })
}

/// Query for text made only of stopwords: every term must match.
fn stopwords_query(container: &ContainerConfig, text: &str) -> QueryNode {
    QueryNode::Match {
        field: Analyzer::Whitespace.sub_field(&container.mapping.search_field),
        text: text.to_string(),
        minimum_should_match: Some(ALL_TERMS.to_string()),
        phrase: false,
        boost: 1.0,
    }
}

/// Builds the branch of a variant: its multi-field match, optional phrase boost, optional
/// common-terms filter.
fn composed_branch(container: &ContainerConfig, text: &str, variant: Variant) -> QueryNode {
    let relevance = &container.relevance;
    let search_field = &container.mapping.search_field;
    let multi_match = variant_clause(container, text, variant);

    let query = match relevance.phrase_match_boost {
        Some(phrase_boost) => {
            let analyzer = if text.split_whitespace().nth(1).is_some() {
                Analyzer::Shingle
            } else {
                Analyzer::Whitespace
            };
            let phrase = QueryNode::phrase(analyzer.sub_field(search_field), text)
                .with_boost(f64::from(phrase_boost));
            QueryNode::or(vec![multi_match, phrase])
        }
        None => multi_match,
    };

    match relevance.cutoff_frequency {
        Some(cutoff_frequency) => QueryNode::filtered(
            query,
            QueryNode::Common {
                field: search_field.clone(),
                text: text.to_string(),
                cutoff_frequency,
                minimum_should_match: Some(relevance.minimum_should_match.clone()),
                boost: 1.0,
            },
        ),
        None => query,
    }
}

/// Builds the multi-field match of a variant.
fn variant_clause(container: &ContainerConfig, text: &str, variant: Variant) -> QueryNode {
    let relevance = &container.relevance;
    let mapping = &container.mapping;

    let (fields, minimum_should_match, fuzziness) = match variant {
        Variant::Exact => {
            let mut fields: Vec<WeightedField> = mapping
                .searchable_fields()
                .map(|f| WeightedField::new(f.name.clone(), f.weight))
                .collect();
            if fields.is_empty() {
                fields.push(WeightedField::new(mapping.search_field.clone(), 1.0));
            }
            (fields, relevance.minimum_should_match.clone(), None)
        }
        Variant::Fuzzy => (
            spelling_fields(container, Analyzer::Whitespace),
            relevance.fuzziness.minimum_should_match.clone(),
            Some(Fuzziness {
                value: relevance.fuzziness.value.clone(),
                prefix_length: relevance.fuzziness.prefix_length,
                max_expansions: relevance.fuzziness.max_expansions,
            }),
        ),
        Variant::Phonetic => (
            spelling_fields(container, Analyzer::Phonetic),
            relevance.fuzziness.minimum_should_match.clone(),
            None,
        ),
    };

    QueryNode::MultiMatch {
        fields,
        text: text.to_string(),
        minimum_should_match: Some(minimum_should_match),
        tie_breaker: Some(f64::from(relevance.tie_breaker)),
        fuzziness,
        cutoff_frequency: None,
        boost: 1.0,
    }
}

/// Returns analyzer sub-fields of the spellcheck fields plus the spelling field.
fn spelling_fields(container: &ContainerConfig, analyzer: Analyzer) -> Vec<WeightedField> {
    let mapping = &container.mapping;
    let sub_field = |f: &FieldDefinition| WeightedField::new(analyzer.sub_field(&f.name), f.weight);
    let mut fields: Vec<WeightedField> = mapping.spellcheck_fields().map(sub_field).collect();
    fields.push(WeightedField::new(
        analyzer.sub_field(&mapping.spelling_field),
        1.0,
    ));
    fields
}
