//! Property tests for the compiler's structural guarantees.

#![allow(clippy::tests_outside_test_module)]

use cq_config::{ContainerConfig, FieldDefinition, FieldType, Mapping, RelevanceConfig};
use cq_query::QueryNode;
use cq_search::{
    Category, FieldMapper, FulltextQueryBuilder, InMemoryCategoryStore, SpellingType, VirtualRule,
    VirtualRuleResolver,
    rule::{ExcludedCategories, Operator},
};
use proptest::prelude::*;

/// Builds a catalog container with the given relevance settings.
fn container(relevance: RelevanceConfig) -> ContainerConfig {
    let mut name = FieldDefinition::new("name", FieldType::Text);
    name.weight = 3.0;
    name.spellcheck = true;
    let mut sku = FieldDefinition::new("sku", FieldType::Text);
    sku.weight = 1.0;

    ContainerConfig {
        name: "catalog".into(),
        index: "catalog_products".into(),
        type_name: "product".into(),
        mapping: Mapping::from_fields([name, sku]),
        relevance,
        aggregations: Vec::new(),
        collapse: None,
    }
}

fn spelling_strategy() -> impl Strategy<Value = SpellingType> {
    prop_oneof![
        Just(SpellingType::Exact),
        Just(SpellingType::MostExact),
        Just(SpellingType::Fuzzy),
        Just(SpellingType::MostFuzzy),
        Just(SpellingType::PureStopwords),
    ]
}

fn relevance_strategy() -> impl Strategy<Value = RelevanceConfig> {
    (
        any::<bool>(),
        any::<bool>(),
        0usize..=4,
        prop::option::of(0.01f64..1.0),
        prop::option::of(1u32..20),
    )
        .prop_map(|(fuzzy, phonetic, max_depth, cutoff, phrase)| {
            let mut relevance = RelevanceConfig::default();
            relevance.fuzziness.enabled = fuzzy;
            relevance.phonetic.enabled = phonetic;
            relevance.max_depth = max_depth;
            relevance.cutoff_frequency = cutoff;
            relevance.phrase_match_boost = phrase;
            relevance
        })
}

/// Returns whether the tree holds a fuzzy or phonetic branch.
fn has_expansion(query: &QueryNode) -> bool {
    query.any(&|node| match node {
        QueryNode::Bool(inner) => inner
            .name
            .as_deref()
            .is_some_and(|name| name.ends_with(".fuzzy") || name.ends_with(".phonetic")),
        _ => false,
    })
}

/// Virtual categories `1..=n`, each referencing others and matching one color.
fn category_graph() -> impl Strategy<Value = Vec<Category>> {
    (2u64..7).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(1..=n, 0..4), n as usize).prop_map(
            move |references| {
                references
                    .into_iter()
                    .zip(1..=n)
                    .map(|(ids, id)| {
                        let rule = VirtualRule::any(vec![
                            VirtualRule::categories(ids),
                            VirtualRule::condition(
                                "color",
                                Operator::Eq,
                                format!("c{id}"),
                            ),
                        ]);
                        Category::virtual_category(id, rule)
                    })
                    .collect()
            },
        )
    })
}

proptest! {
    #[test]
    fn empty_text_is_match_all(
        text in "[ \t\n]{0,8}",
        spelling in spelling_strategy(),
        relevance in relevance_strategy(),
        depth in 0usize..5,
    ) {
        let container = container(relevance);
        let query = FulltextQueryBuilder::new().build(&container, &text, spelling, 1.0, depth);
        let match_all = QueryNode::MatchAll { boost: 1.0 };
        prop_assert_eq!(query, match_all);
    }

    #[test]
    fn disabled_fuzziness_never_adds_fuzzy_clauses(
        text in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        spelling in spelling_strategy(),
        relevance in relevance_strategy(),
        depth in 0usize..5,
    ) {
        let mut relevance = relevance;
        relevance.fuzziness.enabled = false;
        let container = container(relevance);
        let query = FulltextQueryBuilder::new().build(&container, &text, spelling, 1.0, depth);
        let fuzzy = query.any(&|node| matches!(
            node,
            QueryNode::MultiMatch { fuzziness: Some(_), .. }
        ));
        prop_assert!(!fuzzy);
    }

    #[test]
    fn no_expansion_at_or_past_max_depth(
        text in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        spelling in spelling_strategy(),
        relevance in relevance_strategy(),
        extra in 0usize..4,
    ) {
        let depth = relevance.max_depth + extra;
        let container = container(relevance);
        let query = FulltextQueryBuilder::new().build(&container, &text, spelling, 1.0, depth);
        prop_assert!(!has_expansion(&query));
    }

    #[test]
    fn compiled_fulltext_is_valid(
        text in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        spelling in spelling_strategy(),
        relevance in relevance_strategy(),
    ) {
        let container = container(relevance);
        let query = FulltextQueryBuilder::new().build(&container, &text, spelling, 1.0, 0);
        prop_assert!(query.validate().is_ok());
        prop_assert!(query.to_json().get("bool").is_some());
    }

    #[test]
    fn cyclic_rules_terminate_deterministically(categories in category_graph()) {
        let ids: Vec<u64> = categories.iter().map(|c| c.id).collect();
        let store = InMemoryCategoryStore::new(categories);
        let field_mapper = FieldMapper::default();
        let mapping = Mapping::from_fields([FieldDefinition::new("color", FieldType::Keyword)]);
        let resolver = VirtualRuleResolver::new(&store, &field_mapper, &mapping);

        for id in ids {
            let first = resolver.resolve_id(id, &ExcludedCategories::new()).unwrap();
            let second = resolver.resolve_id(id, &ExcludedCategories::new()).unwrap();
            prop_assert!(first.validate().is_ok());
            prop_assert_eq!(first, second);
        }
    }
}
