//! Compilation of rule trees into query nodes.

use std::collections::HashMap;

use cq_config::Mapping;
use cq_query::{FieldValue, QueryNode, RangeBounds};
use tracing::{debug, warn};

use super::{Aggregator, Category, CategoryStore, Condition, ExcludedCategories, Operator, VirtualRule};
use crate::{SearchError, field_mapper::FieldMapper};

/// Logical name of the category membership field.
const CATEGORY_FIELD: &str = "category_id";

/// Minimum should match of the contains operator.
const ALL_TERMS: &str = "100%";

/// Queries compiled during one resolution call, keyed by category id and exclusion set.
type Memo = HashMap<(u64, Vec<u64>), QueryNode>;

/// Compiles virtual category rules into queries.
///
/// The resolver holds no state between calls. Each call threads its own
/// [`ExcludedCategories`] down the recursion and memoizes compiled categories for the duration
/// of the call only.
pub struct VirtualRuleResolver<'a> {
    /// Category records.
    store: &'a dyn CategoryStore,
    /// Logical to physical field translation.
    field_mapper: &'a FieldMapper,
    /// Mapping of the container the rules are compiled for.
    mapping: &'a Mapping,
}

impl<'a> VirtualRuleResolver<'a> {
    /// Creates a resolver.
    pub fn new(
        store: &'a dyn CategoryStore,
        field_mapper: &'a FieldMapper,
        mapping: &'a Mapping,
    ) -> Self {
        Self {
            store,
            field_mapper,
            mapping,
        }
    }

    /// Compiles the membership query of `category`.
    ///
    /// Categories in `excluded` resolve to `MatchNone`, which is how reference cycles end.
    pub fn resolve(&self, category: &Category, excluded: &ExcludedCategories) -> QueryNode {
        let mut memo = Memo::new();
        let query = self.category_query(category, excluded, &mut memo);
        debug!(category = category.id, compiled = memo.len(), "resolved category");
        query
    }

    /// Looks up a category and compiles its membership query.
    pub fn resolve_id(
        &self,
        id: u64,
        excluded: &ExcludedCategories,
    ) -> Result<QueryNode, SearchError> {
        let category = self
            .store
            .category(id)
            .ok_or(SearchError::UnknownCategory { id })?;
        Ok(self.resolve(&category, excluded))
    }

    /// Compiles a free-standing rule tree.
    pub fn compile_rule(&self, rule: &VirtualRule, excluded: &ExcludedCategories) -> QueryNode {
        self.rule_query(rule, excluded, &mut Memo::new())
    }

    /// Compiles a category found in the store or referenced by a rule.
    fn category_query(
        &self,
        category: &Category,
        excluded: &ExcludedCategories,
        memo: &mut Memo,
    ) -> QueryNode {
        if excluded.contains(category.id) {
            warn!(
                category = category.id,
                excluded = ?excluded,
                "category reference cycle, matching nothing"
            );
            return QueryNode::MatchNone;
        }
        if !category.is_virtual {
            return self.membership(category.id);
        }

        let key = (category.id, excluded.sorted());
        if let Some(query) = memo.get(&key) {
            return query.clone();
        }

        let inner = excluded.with(category.id);
        let rule = category
            .rule
            .as_ref()
            .map_or_else(QueryNode::match_all, |rule| self.rule_query(rule, &inner, memo));
        let query = match category.virtual_root {
            Some(root) => QueryNode::and(vec![rule, self.reference(root, &inner, memo)]),
            None => rule,
        };

        memo.insert(key, query.clone());
        query
    }

    /// Compiles a reference to category `id`.
    fn reference(&self, id: u64, excluded: &ExcludedCategories, memo: &mut Memo) -> QueryNode {
        match self.store.category(id) {
            Some(category) => self.category_query(&category, excluded, memo),
            None if excluded.contains(id) => {
                warn!(category = id, "category reference cycle, matching nothing");
                QueryNode::MatchNone
            }
            None => self.membership(id),
        }
    }

    /// Compiles one rule node.
    fn rule_query(
        &self,
        rule: &VirtualRule,
        excluded: &ExcludedCategories,
        memo: &mut Memo,
    ) -> QueryNode {
        match rule {
            VirtualRule::Combine {
                aggregator,
                expected,
                children,
            } => {
                let compiled: Vec<QueryNode> = children
                    .iter()
                    .map(|child| self.rule_query(child, excluded, memo))
                    .collect();
                combine(*aggregator, *expected, compiled)
            }
            VirtualRule::Condition(condition) => {
                condition_query(self.field_mapper, self.mapping, condition)
            }
            VirtualRule::Category { ids } => {
                if ids.is_empty() {
                    return QueryNode::match_all();
                }
                QueryNode::or(
                    ids.iter()
                        .map(|id| self.reference(*id, excluded, memo))
                        .collect(),
                )
            }
        }
    }

    /// Membership of a plain category.
    fn membership(&self, id: u64) -> QueryNode {
        let field = self.field_mapper.map(CATEGORY_FIELD, self.mapping);
        field.scope(QueryNode::term(field.path.clone(), id))
    }
}

/// Combines compiled children.
fn combine(aggregator: Aggregator, expected: bool, children: Vec<QueryNode>) -> QueryNode {
    if children.is_empty() {
        return QueryNode::match_all();
    }
    match (aggregator, expected) {
        (Aggregator::All, true) => QueryNode::and(children),
        (Aggregator::Any, true) => QueryNode::or(children),
        (Aggregator::All, false) => {
            let excluded: Vec<QueryNode> = children
                .into_iter()
                .filter(|child| !child.is_match_none())
                .map(QueryNode::not)
                .collect();
            QueryNode::and(excluded)
        }
        (Aggregator::Any, false) => QueryNode::or(children.into_iter().map(negate).collect()),
    }
}

/// Negates a node, folding the constant cases.
fn negate(node: QueryNode) -> QueryNode {
    match node {
        QueryNode::MatchNone => QueryNode::match_all(),
        QueryNode::MatchAll { .. } => QueryNode::MatchNone,
        other => QueryNode::not(other),
    }
}

/// Compiles an attribute condition.
///
/// The attribute goes through the field mapper; conditions on nested fields are scoped to
/// their nested path, with negation applied outside the scope. Conditions without a value
/// match everything.
pub fn condition_query(
    field_mapper: &FieldMapper,
    mapping: &Mapping,
    condition: &Condition,
) -> QueryNode {
    let Some(first) = condition.value.first() else {
        warn!(attribute = %condition.attribute, "ignoring condition without value");
        return QueryNode::match_all();
    };

    let field = field_mapper.map(&condition.attribute, mapping);
    let path = field.path.clone();
    let bound = |set: fn(&mut RangeBounds, FieldValue)| {
        let mut bounds = RangeBounds::default();
        set(&mut bounds, first.clone());
        QueryNode::range(path.clone(), bounds)
    };

    let positive = match condition.operator {
        Operator::Eq | Operator::Ne if condition.value.len() == 1 => {
            QueryNode::term(path.clone(), first.clone())
        }
        Operator::Eq | Operator::Ne | Operator::In | Operator::NotIn => {
            QueryNode::terms(path.clone(), condition.value.clone())
        }
        Operator::Gte => bound(|b, v| b.gte = Some(v)),
        Operator::Lte => bound(|b, v| b.lte = Some(v)),
        Operator::Gt => bound(|b, v| b.gt = Some(v)),
        Operator::Lt => bound(|b, v| b.lt = Some(v)),
        Operator::Contains | Operator::NotContains => QueryNode::Match {
            field: path.clone(),
            text: first.to_string(),
            minimum_should_match: Some(ALL_TERMS.to_string()),
            phrase: false,
            boost: 1.0,
        },
    };

    let scoped = field.scope(positive);
    if condition.operator.is_negated() {
        QueryNode::not(scoped)
    } else {
        scoped
    }
}
