//! Server version compatibility.
//!
//! Compiled requests always use the current request format. [`CompatibilityPass`] rewrites a
//! compiled body for the server version it is sent to, and reports features the server cannot
//! express instead of silently dropping them.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

/// Errors raised while adapting a request to a server version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompatError {
    /// The request uses a feature the server does not support.
    #[error("{feature} is not supported by server version {version}")]
    Unsupported {
        /// Feature name.
        feature: String,
        /// Target server version.
        version: ServerVersion,
    },

    /// A server version string could not be read.
    #[error("invalid server version '{version}'")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
    },
}

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl ServerVersion {
    /// Creates a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns whether this version is older than `major.minor`.
    fn before(self, major: u32, minor: u32) -> bool {
        (self.major, self.minor).cmp(&(major, minor)) == Ordering::Less
    }
}

impl FromStr for ServerVersion {
    type Err = CompatError;

    /// Parses `7`, `7.10` or `7.10.2`; a pre-release suffix such as `-SNAPSHOT` is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompatError::InvalidVersion {
            version: s.to_string(),
        };
        let release = s.trim().split(['-', '+']).next().unwrap_or_default();
        let mut parts = release.split('.');
        let mut next = |required: bool| -> Result<u32, CompatError> {
            match parts.next() {
                Some(part) => part.parse().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };
        let version = Self::new(next(true)?, next(false)?, next(false)?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Rewrites compiled documents for one server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityPass {
    /// Target server version.
    version: ServerVersion,
}

impl CompatibilityPass {
    /// Creates a pass for `version`.
    pub fn new(version: ServerVersion) -> Self {
        Self { version }
    }

    /// Returns the target version.
    pub fn version(&self) -> ServerVersion {
        self.version
    }

    /// Adapts a compiled search request body.
    pub fn apply_request(&self, body: &mut Value) -> Result<(), CompatError> {
        let version = self.version;
        let Some(request) = body.as_object_mut() else {
            return Ok(());
        };

        if version.major < 7 {
            request.remove("track_total_hits");
        }
        if let Some(collapse) = request.get_mut("collapse") {
            self.adapt_collapse(collapse)?;
        }
        if version.before(6, 1)
            && let Some(Value::Array(sort)) = request.get_mut("sort")
        {
            sort.iter_mut().for_each(legacy_nested_sort);
        }

        walk_objects(body, &mut |object| {
            rename_terms_order(object, version);
            if version.major >= 8 {
                rewrite_common(object);
                if let Some(Value::Object(multi_match)) = object.get_mut("multi_match") {
                    multi_match.remove("cutoff_frequency");
                }
            }
        });
        debug!(%version, "applied request compatibility");
        Ok(())
    }

    /// Adapts an index mapping document.
    ///
    /// Servers before 5 describe `norms` and `fielddata` as `{"enabled": bool}` objects; later
    /// servers use plain booleans.
    pub fn apply_mapping(&self, mapping: &mut Value) {
        let legacy = self.version.major < 5;
        walk_objects(mapping, &mut |object| {
            for key in ["norms", "fielddata"] {
                let Some(setting) = object.get_mut(key) else {
                    continue;
                };
                let replacement = match (legacy, &*setting) {
                    (true, Value::Bool(enabled)) => Some(json!({ "enabled": enabled })),
                    (false, Value::Object(inner)) => {
                        inner.get("enabled").and_then(Value::as_bool).map(Value::Bool)
                    }
                    _ => None,
                };
                if let Some(replacement) = replacement {
                    *setting = replacement;
                }
            }
        });
    }

    /// Adapts the metadata line of a bulk action such as `{"index": {"_index": ..}}`.
    ///
    /// Servers before 7 require the document type; later servers reject it.
    pub fn apply_bulk_action(&self, action: &mut Value, type_name: &str) {
        let Some(actions) = action.as_object_mut() else {
            return;
        };
        for metadata in actions.values_mut().filter_map(Value::as_object_mut) {
            if self.version.major < 7 {
                metadata.insert("_type".into(), json!(type_name));
            } else {
                metadata.remove("_type");
            }
        }
    }

    /// Adapts a collapse clause.
    ///
    /// Collapsing needs 5.3. Until 6.4 a collapse carries a single inner hits object.
    fn adapt_collapse(&self, collapse: &mut Value) -> Result<(), CompatError> {
        let version = self.version;
        if version.before(5, 3) {
            return Err(self.unsupported("collapse"));
        }
        if !version.before(6, 4) {
            return Ok(());
        }
        let Some(Value::Array(inner_hits)) = collapse.get_mut("inner_hits") else {
            return Ok(());
        };
        match inner_hits.len() {
            0 | 1 => {
                let single = inner_hits.pop();
                if let Some(clause) = collapse.as_object_mut() {
                    match single {
                        Some(inner) => clause.insert("inner_hits".into(), inner),
                        None => clause.remove("inner_hits"),
                    };
                }
                Ok(())
            }
            _ => Err(self.unsupported("multiple collapse inner hits")),
        }
    }

    /// Creates an `Unsupported` error for the target version.
    fn unsupported(&self, feature: &str) -> CompatError {
        CompatError::Unsupported {
            feature: feature.to_string(),
            version: self.version,
        }
    }
}

/// Calls `f` on every object of the tree, parents before children.
fn walk_objects(value: &mut Value, f: &mut dyn FnMut(&mut Map<String, Value>)) {
    match value {
        Value::Object(object) => {
            f(object);
            for child in object.values_mut() {
                walk_objects(child, f);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_objects(item, f);
            }
        }
        _ => {}
    }
}

/// Uses `_term` as the terms order key before 6 and `_key` from 6.
fn rename_terms_order(object: &mut Map<String, Value>, version: ServerVersion) {
    let Some(Value::Object(order)) = object
        .get_mut("terms")
        .and_then(|terms| terms.get_mut("order"))
    else {
        return;
    };
    let (from, to) = if version.major < 6 {
        ("_key", "_term")
    } else {
        ("_term", "_key")
    };
    if let Some(direction) = order.remove(from) {
        order.insert(to.into(), direction);
    }
}

/// Rewrites a `common` query as a `match` query with the low-frequency minimum should match.
///
/// Only objects whose field bodies all carry a `cutoff_frequency` are queries; anything else
/// named `common` is a field.
fn rewrite_common(object: &mut Map<String, Value>) {
    let is_query = match object.get("common") {
        Some(Value::Object(fields)) => {
            !fields.is_empty()
                && fields
                    .values()
                    .all(|body| body.get("cutoff_frequency").is_some())
        }
        _ => false,
    };
    if !is_query {
        return;
    }
    let Some(Value::Object(common)) = object.remove("common") else {
        return;
    };
    let fields: Map<String, Value> = common
        .into_iter()
        .map(|(field, mut body)| {
            if let Some(body) = body.as_object_mut() {
                body.remove("cutoff_frequency");
                let low_freq = body
                    .get("minimum_should_match")
                    .and_then(|msm| msm.get("low_freq"))
                    .cloned();
                if let Some(low_freq) = low_freq {
                    body.insert("minimum_should_match".into(), low_freq);
                }
            }
            (field, body)
        })
        .collect();
    object.insert("match".into(), Value::Object(fields));
}

/// Moves a nested sort's `nested` object to the legacy `nested_path` and `nested_filter` keys.
fn legacy_nested_sort(order: &mut Value) {
    let Some(fields) = order.as_object_mut() else {
        return;
    };
    for clause in fields.values_mut().filter_map(Value::as_object_mut) {
        let Some(Value::Object(mut nested)) = clause.remove("nested") else {
            continue;
        };
        if let Some(path) = nested.remove("path") {
            clause.insert("nested_path".into(), path);
        }
        if let Some(filter) = nested.remove("filter") {
            clause.insert("nested_filter".into(), filter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(version: &str) -> CompatibilityPass {
        CompatibilityPass::new(version.parse().unwrap())
    }

    #[test]
    fn parses_versions() {
        assert_eq!(
            "7.10.2".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(7, 10, 2)
        );
        assert_eq!("6".parse::<ServerVersion>().unwrap(), ServerVersion::new(6, 0, 0));
        assert_eq!(
            "8.1.0-SNAPSHOT".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(8, 1, 0)
        );
        assert!("seven".parse::<ServerVersion>().is_err());
        assert!("7.1.2.3".parse::<ServerVersion>().is_err());
        assert!("".parse::<ServerVersion>().is_err());
        assert_eq!(ServerVersion::new(5, 6, 16).to_string(), "5.6.16");
    }

    #[test]
    fn versions_order_numerically() {
        assert!(ServerVersion::new(6, 10, 0) > ServerVersion::new(6, 4, 3));
        assert!(ServerVersion::new(7, 0, 0) > ServerVersion::new(6, 8, 23));
    }

    #[test]
    fn track_total_hits_needs_7() {
        let mut body = json!({ "query": { "match_all": {} }, "track_total_hits": true });
        pass("6.8.0").apply_request(&mut body).unwrap();
        assert!(body.get("track_total_hits").is_none());

        let mut body = json!({ "track_total_hits": true });
        pass("7.0.0").apply_request(&mut body).unwrap();
        assert_eq!(body["track_total_hits"], true);
    }

    #[test]
    fn terms_order_key_follows_version() {
        let body = json!({
            "aggregations": {
                "color": { "terms": { "field": "color", "order": { "_key": "asc" } } }
            }
        });

        let mut legacy = body.clone();
        pass("5.6.0").apply_request(&mut legacy).unwrap();
        assert_eq!(
            legacy["aggregations"]["color"]["terms"]["order"],
            json!({ "_term": "asc" })
        );

        let mut current = legacy;
        pass("6.0.0").apply_request(&mut current).unwrap();
        assert_eq!(current, body);
    }

    #[test]
    fn common_becomes_match_on_8() {
        let mut body = json!({
            "query": {
                "bool": {
                    "must": [{
                        "multi_match": { "query": "red", "fields": ["name^3"], "cutoff_frequency": 0.1 }
                    }],
                    "filter": [{
                        "common": {
                            "search": {
                                "query": "red shoes",
                                "cutoff_frequency": 0.1,
                                "minimum_should_match": { "low_freq": "100%" }
                            }
                        }
                    }]
                }
            }
        });
        let original = body.clone();

        pass("8.11.0").apply_request(&mut body).unwrap();
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "match": { "search": { "query": "red shoes", "minimum_should_match": "100%" } } })
        );
        assert!(body["query"]["bool"]["must"][0]["multi_match"]
            .get("cutoff_frequency")
            .is_none());

        let mut seven = original.clone();
        pass("7.17.0").apply_request(&mut seven).unwrap();
        assert_eq!(seven, original);
    }

    #[test]
    fn collapse_is_rejected_before_5_3() {
        let mut body = json!({ "collapse": { "field": "sku" } });
        let err = pass("5.2.2").apply_request(&mut body).unwrap_err();
        assert!(matches!(err, CompatError::Unsupported { ref feature, .. } if feature == "collapse"));
        assert!(err.to_string().contains("5.2.2"));
    }

    #[test]
    fn single_inner_hits_unwrapped_before_6_4() {
        let mut body = json!({
            "collapse": { "field": "sku", "inner_hits": [{ "name": "variants", "size": 3 }] }
        });
        pass("6.3.0").apply_request(&mut body).unwrap();
        assert_eq!(
            body["collapse"]["inner_hits"],
            json!({ "name": "variants", "size": 3 })
        );

        let mut body = json!({
            "collapse": { "field": "sku", "inner_hits": [{ "name": "a" }, { "name": "b" }] }
        });
        assert!(pass("6.3.0").apply_request(&mut body).is_err());
        assert!(pass("6.4.0").apply_request(&mut body).is_ok());
        assert_eq!(body["collapse"]["inner_hits"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn nested_sort_uses_legacy_keys_before_6_1() {
        let mut body = json!({
            "sort": [{
                "price.price": {
                    "order": "asc",
                    "mode": "min",
                    "nested": { "path": "price", "filter": { "term": { "price.customer_group_id": 0 } } }
                }
            }]
        });
        pass("6.0.1").apply_request(&mut body).unwrap();
        assert_eq!(
            body["sort"][0]["price.price"],
            json!({
                "order": "asc",
                "mode": "min",
                "nested_path": "price",
                "nested_filter": { "term": { "price.customer_group_id": 0 } }
            })
        );
    }

    #[test]
    fn mapping_norms_and_fielddata() {
        let mut mapping = json!({
            "properties": { "name": { "type": "text", "norms": false, "fielddata": true } }
        });
        pass("2.4.6").apply_mapping(&mut mapping);
        assert_eq!(
            mapping["properties"]["name"]["norms"],
            json!({ "enabled": false })
        );

        pass("7.10.2").apply_mapping(&mut mapping);
        assert_eq!(mapping["properties"]["name"]["norms"], false);
        assert_eq!(mapping["properties"]["name"]["fielddata"], true);
    }

    #[test]
    fn bulk_action_type_follows_version() {
        let mut action = json!({ "index": { "_index": "catalog_products", "_id": "1" } });
        pass("6.8.0").apply_bulk_action(&mut action, "product");
        assert_eq!(action["index"]["_type"], "product");

        pass("7.0.0").apply_bulk_action(&mut action, "product");
        assert!(action["index"].get("_type").is_none());
    }
}
