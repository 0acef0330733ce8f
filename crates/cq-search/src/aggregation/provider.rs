//! Aggregation providers.

use cq_config::{BucketConfig, BucketType, ContainerConfig, GroupQuery, Mapping};
use cq_query::{QueryNode, RangeBounds};
use indexmap::IndexMap;
use tracing::warn;

use super::{AggregationProvider, BucketKind, BucketRequest};
use crate::{field_mapper::FieldMapper, response::AttributeCoverage};

/// Name of the bucket counting documents per attribute set.
pub const ATTRIBUTE_SET_BUCKET: &str = "attribute_set_id";

/// Name of the bucket counting documents per indexed attribute.
pub const INDEXED_ATTRIBUTES_BUCKET: &str = "indexed_attributes";

/// Buckets declared in the container configuration.
///
/// Each facet bucket is filtered by the facet filters of the other facets, so a facet keeps
/// showing its own alternatives while one of its values is selected.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAggregations {
    /// Translates configured field names.
    field_mapper: FieldMapper,
}

impl ConfiguredAggregations {
    /// Creates a provider translating fields with `field_mapper`.
    pub fn new(field_mapper: FieldMapper) -> Self {
        Self { field_mapper }
    }

    /// Converts one configured bucket.
    fn bucket(&self, config: &BucketConfig, mapping: &Mapping) -> Option<BucketRequest> {
        let (kind, nested_path) = match config.kind {
            BucketType::Term => {
                let field = self.field_mapper.map(config.field.as_deref()?, mapping);
                let kind = BucketKind::Term {
                    field: field.path,
                    size: config.size,
                    order: config.order,
                    min_doc_count: config.min_doc_count,
                };
                (kind, field.nested_path)
            }
            BucketType::Histogram => {
                let field = self.field_mapper.map(config.field.as_deref()?, mapping);
                let kind = BucketKind::Histogram {
                    field: field.path,
                    interval: config.interval?,
                    min_doc_count: config.min_doc_count,
                };
                (kind, field.nested_path)
            }
            BucketType::QueryGroup => {
                let queries = config
                    .queries
                    .iter()
                    .map(|q| (q.name.clone(), self.group_query(q, mapping)))
                    .collect();
                (BucketKind::QueryGroup { queries }, None)
            }
        };

        Some(BucketRequest {
            nested_path,
            ..BucketRequest::new(config.name.clone(), kind)
        })
    }

    /// Compiles one query of a query group.
    fn group_query(&self, query: &GroupQuery, mapping: &Mapping) -> QueryNode {
        let field = self.field_mapper.map(&query.field, mapping);
        let node = if query.is_range() {
            QueryNode::range(
                field.path.clone(),
                RangeBounds {
                    gt: query.gt.clone(),
                    gte: query.gte.clone(),
                    lt: query.lt.clone(),
                    lte: query.lte.clone(),
                },
            )
        } else {
            match query.value {
                Some(ref value) => QueryNode::term(field.path.clone(), value.clone()),
                None => QueryNode::exists(field.path.clone()),
            }
        };
        field.scope(node)
    }
}

impl AggregationProvider for ConfiguredAggregations {
    fn aggregations(
        &self,
        container: &ContainerConfig,
        _query: &QueryNode,
        filters: &IndexMap<String, QueryNode>,
        _query_filters: &[QueryNode],
    ) -> IndexMap<String, BucketRequest> {
        container
            .aggregations
            .iter()
            .filter_map(|config| {
                let mut bucket = self.bucket(config, &container.mapping)?;
                let others: Vec<QueryNode> = filters
                    .iter()
                    .filter(|(name, _)| **name != config.name)
                    .map(|(_, filter)| filter.clone())
                    .collect();
                if !others.is_empty() {
                    bucket.filter = Some(QueryNode::and(others));
                }
                Some((bucket.name.clone(), bucket))
            })
            .collect()
    }
}

/// Buckets measuring which attributes the matching documents carry.
///
/// Their counts feed [`AttributeCoverage`], which [`CoverageRateFilter`] uses to hide facets
/// too few documents can use.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageAggregations;

impl AggregationProvider for CoverageAggregations {
    fn aggregations(
        &self,
        _container: &ContainerConfig,
        _query: &QueryNode,
        _filters: &IndexMap<String, QueryNode>,
        _query_filters: &[QueryNode],
    ) -> IndexMap<String, BucketRequest> {
        [ATTRIBUTE_SET_BUCKET, INDEXED_ATTRIBUTES_BUCKET]
            .into_iter()
            .map(|name| (name.to_string(), BucketRequest::term(name, name, 0)))
            .collect()
    }
}

/// Drops facets whose attribute coverage is under the field's minimum rate.
pub struct CoverageRateFilter {
    /// Provider whose buckets are filtered.
    inner: Box<dyn AggregationProvider>,
    /// Coverage measured by a previous coverage search.
    coverage: AttributeCoverage,
}

impl CoverageRateFilter {
    /// Wraps `inner`, filtering its buckets with `coverage`.
    pub fn new(inner: impl AggregationProvider + 'static, coverage: AttributeCoverage) -> Self {
        Self {
            inner: Box::new(inner),
            coverage,
        }
    }
}

impl AggregationProvider for CoverageRateFilter {
    fn aggregations(
        &self,
        container: &ContainerConfig,
        query: &QueryNode,
        filters: &IndexMap<String, QueryNode>,
        query_filters: &[QueryNode],
    ) -> IndexMap<String, BucketRequest> {
        let mut buckets = self
            .inner
            .aggregations(container, query, filters, query_filters);
        buckets.retain(|name, bucket| {
            let Some(min_rate) = bucket
                .field()
                .and_then(|field| container.mapping.field(field))
                .map(|definition| definition.facet_min_coverage_rate)
                .filter(|rate| *rate > 0.0)
            else {
                return true;
            };
            let rate = self.coverage.rate(name);
            if rate < min_rate {
                warn!(
                    facet = %name,
                    rate,
                    min_rate,
                    "dropping facet under its minimum coverage rate"
                );
                return false;
            }
            true
        });
        buckets
    }
}
