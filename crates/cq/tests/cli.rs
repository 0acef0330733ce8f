//! CLI integration tests for cq commands.
//!
//! These tests focus on exit codes and the compiled JSON, not on table formatting.

// Integration tests live outside cfg(test)
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a cq command.
fn cq() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("cq").unwrap()
}

/// Helper to run `cq` in `dir` with HOME isolated to it.
fn cq_in(dir: &Path) -> Command {
    let mut cmd = cq();
    cmd.env("HOME", dir).env_remove("CQ_LOG").current_dir(dir);
    cmd
}

const CATALOG: &str = r#"
[engine]
server_version = "7.10.2"

[relevance]
cutoff_frequency = 0.1

[relevance.fuzziness]
enabled = false

[container.catalog]
index = "catalog_products"

[container.catalog.field.name]
weight = 3
spellcheck = true

[container.catalog.field.sku]
weight = 1

[container.catalog.field.color]
type = "keyword"

[container.catalog.field."price.price"]
type = "double"
nested_path = "price"

[[container.catalog.aggregation]]
name = "color"
type = "term"
field = "color"
size = 0
"#;

const CATEGORIES: &str = r#"
[[category]]
id = 3
name = "Shoes"

[[category]]
id = 10
name = "Red"
is_virtual = true

[category.rule]
type = "condition"
attribute = "color"
operator = "=="
value = "red"
"#;

/// Creates a directory holding the catalog configuration.
fn catalog_dir() -> tempfile::TempDir {
    let dir = temp_dir();
    fs::write(dir.path().join(".cq.toml"), CATALOG).unwrap();
    dir
}

/// Runs `cq compile --compact` with extra arguments and parses the output.
fn compile(dir: &Path, args: &[&str]) -> Value {
    let output = cq_in(dir)
        .arg("compile")
        .arg("--compact")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();

        cq_in(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let contents = fs::read_to_string(dir.path().join(".cq.toml")).unwrap();
        assert!(contents.contains("# [container.catalog]"));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        fs::write(dir.path().join(".cq.toml"), "existing").unwrap();

        cq_in(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));
    }

    #[test]
    fn force_overwrites_existing() {
        let dir = temp_dir();
        fs::write(dir.path().join(".cq.toml"), "not = [valid").unwrap();

        cq_in(dir.path()).args(["init", "--force"]).assert().success();

        let contents = fs::read_to_string(dir.path().join(".cq.toml")).unwrap();
        assert!(contents.starts_with("# cq configuration"));
    }
}

mod check {
    use super::*;

    #[test]
    fn succeeds_without_config() {
        let dir = temp_dir();
        cq_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No configuration files found"));
    }

    #[test]
    fn succeeds_with_valid_catalog() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("catalog"))
            .stdout(predicate::str::contains("No issues found"));
    }

    #[test]
    fn warns_without_containers() {
        let dir = temp_dir();
        fs::write(dir.path().join(".cq.toml"), "[relevance]\nmax_depth = 1\n").unwrap();
        cq_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("no containers"));
    }

    #[test]
    fn fails_on_invalid_toml() {
        let dir = temp_dir();
        fs::write(dir.path().join(".cq.toml"), "[relevance\n").unwrap();
        cq_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

mod config {
    use super::*;

    #[test]
    fn prints_effective_settings() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("catalog_products"))
            .stdout(predicate::str::contains("cutoff_frequency"));
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = temp_dir();
        cq_in(dir.path())
            .args(["--config", "missing.toml", "config"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("config file not found"));
    }
}

mod compile {
    use super::*;

    #[test]
    fn weighted_fields_with_cutoff_frequency() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &["red shoes", "--spelling", "exact"]);

        let should = &body["query"]["bool"]["should"];
        assert_eq!(body["query"]["bool"]["_name"], "catalog");
        assert_eq!(
            should[0]["bool"]["must"][0]["multi_match"]["fields"],
            json!(["name^3", "sku^1"])
        );
        assert_eq!(
            should[0]["bool"]["filter"][0]["common"]["search"]["cutoff_frequency"],
            0.1
        );
        assert_eq!(body["size"], 20);
        assert_eq!(body["track_total_hits"], true);
    }

    #[test]
    fn match_all_with_unbounded_facet() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &[]);
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(
            body["aggregations"]["color"],
            json!({ "terms": { "field": "color", "size": 10000 } })
        );
    }

    #[test]
    fn facets_become_post_filter() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &["--facet", "color==red"]);
        assert_eq!(body["post_filter"], json!({ "term": { "color": "red" } }));
    }

    #[test]
    fn filters_restrict_the_query() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &["--filter", "color()red,blue"]);
        let filter = &body["query"]["bool"]["filter"][0];
        assert_eq!(filter, &json!({ "terms": { "color": ["red", "blue"] } }));
    }

    #[test]
    fn category_from_file() {
        let dir = catalog_dir();
        fs::write(dir.path().join("categories.toml"), CATEGORIES).unwrap();
        let body = compile(
            dir.path(),
            &["--category", "10", "--categories", "categories.toml"],
        );
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "term": { "color": "red" } })
        );
    }

    #[test]
    fn old_server_drops_total_hits() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &["--server-version", "6.8.0"]);
        assert!(body.get("track_total_hits").is_none());
    }

    #[test]
    fn nested_sort_is_scoped() {
        let dir = catalog_dir();
        let body = compile(dir.path(), &["--sort", "price.price:desc"]);
        assert_eq!(body["sort"][0]["price.price"]["order"], "desc");
        assert_eq!(body["sort"][0]["price.price"]["nested"]["path"], "price");
    }

    #[test]
    fn invalid_server_version_fails() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .args(["compile", "--server-version", "seven"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("seven"));
    }

    #[test]
    fn invalid_condition_fails() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .args(["compile", "--filter", "color"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid condition"));
    }

    #[test]
    fn unknown_sort_direction_fails() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .args(["compile", "--sort", "price:up"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown sort direction 'up'"));
    }

    #[test]
    fn unknown_container_lists_known() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .args(["compile", "-C", "blog"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown container 'blog'"))
            .stderr(predicate::str::contains("known containers: catalog"));
    }
}

mod explain {
    use super::*;

    #[test]
    fn shows_query_and_buckets() {
        let dir = catalog_dir();
        cq_in(dir.path())
            .args(["explain", "red", "--spelling", "exact"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Query:"))
            .stdout(predicate::str::contains("term (unbounded)"));
    }
}

mod category {
    use super::*;

    #[test]
    fn prints_resolved_rule_as_json() {
        let dir = catalog_dir();
        fs::write(dir.path().join("categories.toml"), CATEGORIES).unwrap();
        let output = cq_in(dir.path())
            .args(["category", "10", "--categories", "categories.toml", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let query: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(query, json!({ "term": { "color": "red" } }));
    }

    #[test]
    fn unknown_category_fails() {
        let dir = catalog_dir();
        fs::write(dir.path().join("categories.toml"), CATEGORIES).unwrap();
        cq_in(dir.path())
            .args(["category", "99", "--categories", "categories.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown category 99"));
    }
}

mod response {
    use super::*;

    const RAW: &str = r#"{
        "hits": {
            "total": { "value": 2, "relation": "eq" },
            "max_score": 1.5,
            "hits": [
                { "_id": "1", "_score": 1.5, "matched_queries": ["catalog"] },
                { "_id": "2", "_score": 0.5 }
            ]
        },
        "aggregations": {
            "color": { "buckets": [{ "key": "red", "doc_count": 2 }] }
        }
    }"#;

    #[test]
    fn normalizes_stdin() {
        let dir = temp_dir();
        let output = cq_in(dir.path())
            .args(["response", "--json"])
            .write_stdin(RAW)
            .output()
            .unwrap();
        assert!(output.status.success());
        let response: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(response["total"], 2);
        assert_eq!(response["documents"][0]["id"], "1");
        assert_eq!(response["aggregations"]["color"]["red"], 2);
    }

    #[test]
    fn prints_tables() {
        let dir = temp_dir();
        fs::write(dir.path().join("raw.json"), RAW).unwrap();
        cq_in(dir.path())
            .args(["response", "raw.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 hits"))
            .stdout(predicate::str::contains("red"));
    }

    #[test]
    fn rejects_response_without_hits() {
        let dir = temp_dir();
        cq_in(dir.path())
            .arg("response")
            .write_stdin("{}")
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing 'hits'"));
    }
}
