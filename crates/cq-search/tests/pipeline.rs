//! End-to-end compilation tests: TOML configuration in, engine request out, and back.

#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::PathBuf, sync::Arc};

use cq_config::{Config, ConfigStore};
use cq_query::QueryNode;
use cq_search::{
    Category, EngineClient, EngineError, FieldMapper, InMemoryCategoryStore, RequestMapper,
    SearchRequest, SearchService, ServerVersion, SpellingType, VirtualRule, VirtualRuleResolver,
    rule::{ExcludedCategories, Operator},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Writes `content` as a config file and loads it.
fn load(content: &str) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join(".cq.toml");
    fs::write(&path, content).unwrap();
    let config = Config::load_from_files(&[path]).unwrap();
    (dir, config)
}

const CATALOG: &str = r#"
[relevance]
cutoff_frequency = 0.1

[container.catalog]
index = "catalog_products"

[container.catalog.field.name]
weight = 3

[container.catalog.field.sku]
weight = 1

[container.catalog.field.color]
type = "keyword"

[[container.catalog.aggregation]]
name = "color"
type = "term"
field = "color"
size = 0
"#;

#[test]
fn weighted_fields_with_cutoff_frequency() {
    let (_dir, config) = load(CATALOG);
    let mapper = RequestMapper::new(Arc::new(config));
    let request = SearchRequest::new("catalog").text_with_spelling("red shoes", SpellingType::Exact);

    let QueryNode::Bool(root) = mapper.main_query(&request).unwrap() else {
        panic!("expected a named disjunction");
    };
    assert_eq!(root.name.as_deref(), Some("catalog"));
    assert_eq!(root.should.len(), 1);

    let QueryNode::Filtered { query, filter, .. } = &root.should[0] else {
        panic!("expected a common-terms filter");
    };
    let QueryNode::MultiMatch { fields, text, .. } = query.as_ref() else {
        panic!("expected a multi match");
    };
    let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
    assert_eq!(fields, ["name^3", "sku^1"]);
    assert_eq!(text, "red shoes");
    assert!(matches!(
        filter.as_ref(),
        QueryNode::Common { cutoff_frequency, .. } if (*cutoff_frequency - 0.1).abs() < 1e-9
    ));

    let expanded = root.should.iter().any(|clause| {
        clause.any(&|node| matches!(node, QueryNode::MultiMatch { fuzziness: Some(_), .. }))
    });
    assert!(!expanded);
}

#[test]
fn zero_size_term_bucket_is_unbounded() {
    let (_dir, config) = load(CATALOG);
    let body = RequestMapper::new(Arc::new(config))
        .build(&SearchRequest::new("catalog"))
        .unwrap();
    assert_eq!(
        body["aggregations"]["color"],
        json!({ "terms": { "field": "color", "size": 10000 } })
    );
}

#[test]
fn reference_cycle_matches_nothing_on_second_visit() {
    let store = InMemoryCategoryStore::new([
        Category::virtual_category(1, VirtualRule::categories([2])),
        Category::virtual_category(2, VirtualRule::categories([1])),
    ]);
    let field_mapper = FieldMapper::default();
    let (_dir, config) = load(CATALOG);
    let mapping = &config.containers["catalog"].mapping;
    let resolver = VirtualRuleResolver::new(&store, &field_mapper, mapping);

    let query = resolver.resolve_id(1, &ExcludedCategories::new()).unwrap();
    assert_eq!(query, QueryNode::MatchNone);
}

#[test]
fn cycle_through_one_sibling_keeps_the_other() {
    let store = InMemoryCategoryStore::new([
        Category::virtual_category(1, VirtualRule::categories([2, 3])),
        Category::virtual_category(2, VirtualRule::categories([1])),
        Category::virtual_category(3, VirtualRule::condition("color", Operator::Eq, "red")),
    ]);
    let field_mapper = FieldMapper::default();
    let (_dir, config) = load(CATALOG);
    let mapping = &config.containers["catalog"].mapping;
    let resolver = VirtualRuleResolver::new(&store, &field_mapper, mapping);

    let query = resolver.resolve_id(1, &ExcludedCategories::new()).unwrap();
    assert_eq!(query, QueryNode::term("color", "red"));
}

/// Engine double answering every search with one response.
struct CannedClient {
    /// Response to every search.
    response: Value,
    /// Bodies received.
    bodies: Mutex<Vec<Value>>,
}

impl EngineClient for CannedClient {
    fn search(&self, index: &str, body: &Value) -> Result<Value, EngineError> {
        if index != "catalog_products" {
            return Err(EngineError::Status {
                status: 404,
                body: format!("no such index [{index}]"),
            });
        }
        self.bodies.lock().push(body.clone());
        Ok(self.response.clone())
    }

    fn server_version(&self) -> Result<ServerVersion, EngineError> {
        Ok(ServerVersion::new(7, 10, 2))
    }
}

#[test]
fn search_service_round_trip() {
    let (_dir, mut config) = load(CATALOG);
    config.engine.server_version = "6.8.0".into();
    let client = Arc::new(CannedClient {
        response: json!({
            "hits": {
                "total": 2,
                "max_score": 1.5,
                "hits": [
                    { "_id": "1", "_score": 1.5, "matched_queries": ["catalog"] },
                    { "_id": "2", "_score": 0.5 }
                ]
            },
            "aggregations": {
                "color": { "buckets": [{ "key": "red", "doc_count": 2 }] }
            }
        }),
        bodies: Mutex::new(Vec::new()),
    });
    let store = Arc::new(ConfigStore::new(config));
    let service = SearchService::new(store, client.clone());

    let request = SearchRequest::new("catalog")
        .text_with_spelling("red", SpellingType::Exact)
        .facet_filter("color", QueryNode::term("color", "red"));
    let response = service.search(&request).unwrap();

    assert_eq!(response.total, 2);
    assert_eq!(response.documents[0].matched_queries, ["catalog"]);
    assert_eq!(response.aggregations["color"]["red"], 2);

    let bodies = client.bodies.lock();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].get("track_total_hits").is_none());
    assert_eq!(bodies[0]["post_filter"], json!({ "term": { "color": "red" } }));
}
