//! Compilation of search requests into engine request bodies.

use std::sync::Arc;

use cq_config::{Config, ContainerConfig};
use cq_query::QueryNode;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{CollapseBuilder, CollapseRequest, RequestQuery, SearchRequest, SortBuilder};
use crate::{
    SearchError,
    aggregation::{
        AggregationBuilder, AggregationResolver, BucketRequest, ConfiguredAggregations,
    },
    field_mapper::FieldMapper,
    fulltext::FulltextQueryBuilder,
    rule::{
        CategoryStore, ExcludedCategories, InMemoryCategoryStore, VirtualRule, VirtualRuleResolver,
    },
    spellcheck::{Spelling, Spellchecker},
};

/// Boost of the main full-text query.
const QUERY_BOOST: f64 = 1.0;

/// Compiles [`SearchRequest`]s against one configuration snapshot.
///
/// Collaborators are injected at construction; compilation itself holds no state, so one
/// mapper serves concurrent requests.
pub struct RequestMapper {
    /// Configuration snapshot used for every compilation.
    config: Arc<Config>,
    /// Logical to physical field translation.
    field_mapper: FieldMapper,
    /// Full-text query builder.
    fulltext: FulltextQueryBuilder,
    /// Spelling lookup for text queries without a known spelling.
    spellchecker: Option<Arc<dyn Spellchecker>>,
    /// Category records for category restrictions.
    categories: Arc<dyn CategoryStore>,
    /// Aggregation providers.
    aggregations: AggregationResolver,
}

impl RequestMapper {
    /// Creates a mapper computing the configured aggregations of each container.
    pub fn new(config: Arc<Config>) -> Self {
        let field_mapper = FieldMapper::from_config(&config);
        let aggregations =
            AggregationResolver::new().with_provider(ConfiguredAggregations::new(field_mapper.clone()));
        Self {
            config,
            field_mapper,
            fulltext: FulltextQueryBuilder::new(),
            spellchecker: None,
            categories: Arc::new(InMemoryCategoryStore::default()),
            aggregations,
        }
    }

    /// Sets the spellchecker used for text queries without a known spelling.
    #[must_use]
    pub fn with_spellchecker(mut self, spellchecker: Arc<dyn Spellchecker>) -> Self {
        self.spellchecker = Some(spellchecker);
        self
    }

    /// Sets the category store used for category restrictions.
    #[must_use]
    pub fn with_categories(mut self, categories: Arc<dyn CategoryStore>) -> Self {
        self.categories = categories;
        self
    }

    /// Replaces the aggregation providers.
    #[must_use]
    pub fn with_aggregations(mut self, aggregations: AggregationResolver) -> Self {
        self.aggregations = aggregations;
        self
    }

    /// Returns the configuration snapshot.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the field mapper.
    pub fn field_mapper(&self) -> &FieldMapper {
        &self.field_mapper
    }

    /// Looks up the container of a request.
    pub fn container(&self, name: &str) -> Result<&ContainerConfig, SearchError> {
        self.config
            .container(name)
            .ok_or_else(|| SearchError::UnknownContainer {
                name: name.to_string(),
            })
    }

    /// Returns the index a request targets.
    pub fn index_name(&self, request: &SearchRequest) -> Result<&str, SearchError> {
        Ok(self.container(&request.container)?.index.as_str())
    }

    /// Compiles the main query of a request, without its structural filters.
    pub fn main_query(&self, request: &SearchRequest) -> Result<QueryNode, SearchError> {
        let container = self.container(&request.container)?;
        let query = match request.query {
            RequestQuery::MatchAll => QueryNode::match_all(),
            RequestQuery::Node(ref node) => node.clone(),
            RequestQuery::Text { ref text, spelling } => {
                let spelling = match (spelling, &self.spellchecker) {
                    (Some(kind), _) => Spelling::new(kind),
                    (None, Some(spellchecker)) => spellchecker.spelling(container, text),
                    (None, None) => Spelling::default(),
                };
                self.fulltext
                    .build_with_spelling(container, text, &spelling, QUERY_BOOST)
            }
        };
        query.validate()?;
        Ok(query)
    }

    /// Compiles the query of a request: the main query restricted by the structural filters
    /// and the category.
    pub fn compile_query(&self, request: &SearchRequest) -> Result<QueryNode, SearchError> {
        let filters = self.query_filters(request)?;
        self.restricted_query(request, filters)
    }

    /// Restricts the main query of a request by already compiled filters.
    fn restricted_query(
        &self,
        request: &SearchRequest,
        filters: Vec<QueryNode>,
    ) -> Result<QueryNode, SearchError> {
        let query = self.main_query(request)?;
        if filters.is_empty() {
            return Ok(query);
        }
        let compiled = QueryNode::filtered(query, QueryNode::and(filters));
        compiled.validate()?;
        Ok(compiled)
    }

    /// Returns the structural filters of a request, including its category.
    fn query_filters(&self, request: &SearchRequest) -> Result<Vec<QueryNode>, SearchError> {
        let container = self.container(&request.container)?;
        let mut filters = request.query_filters.clone();
        if let Some(id) = request.category {
            let resolver = VirtualRuleResolver::new(
                self.categories.as_ref(),
                &self.field_mapper,
                &container.mapping,
            );
            let excluded = ExcludedCategories::new();
            let category = match self.categories.category(id) {
                Some(category) => resolver.resolve(&category, &excluded),
                None => resolver.compile_rule(&VirtualRule::categories([id]), &excluded),
            };
            filters.push(category);
        }
        for filter in &filters {
            filter.validate()?;
        }
        Ok(filters)
    }

    /// Resolves the aggregation buckets a request computes.
    pub fn buckets(
        &self,
        request: &SearchRequest,
    ) -> Result<IndexMap<String, BucketRequest>, SearchError> {
        let container = self.container(&request.container)?;
        let query_filters = self.query_filters(request)?;
        let query = self.restricted_query(request, query_filters.clone())?;
        self.resolve_buckets(container, request, &query, &query_filters)
    }

    /// Runs the aggregation providers and validates the bucket filters they produce.
    fn resolve_buckets(
        &self,
        container: &ContainerConfig,
        request: &SearchRequest,
        query: &QueryNode,
        query_filters: &[QueryNode],
    ) -> Result<IndexMap<String, BucketRequest>, SearchError> {
        let buckets =
            self.aggregations
                .resolve(container, query, &request.facet_filters, query_filters);
        for bucket in buckets.values() {
            if let Some(ref filter) = bucket.filter {
                filter.validate()?;
            }
            if let Some(ref filter) = bucket.nested_filter {
                match bucket.nested_path {
                    Some(ref path) => QueryNode::nested(path.clone(), filter.clone()).validate()?,
                    None => filter.validate()?,
                }
            }
        }
        Ok(buckets)
    }

    /// Compiles a request into an engine request body.
    pub fn build(&self, request: &SearchRequest) -> Result<Value, SearchError> {
        let container = self.container(&request.container)?;
        let query_filters = self.query_filters(request)?;
        let query = self.restricted_query(request, query_filters.clone())?;

        let mut body = Map::new();
        body.insert("query".into(), query.to_json());

        if !request.facet_filters.is_empty() {
            for filter in request.facet_filters.values() {
                filter.validate()?;
            }
            let post_filter = QueryNode::and(request.facet_filters.values().cloned().collect());
            body.insert("post_filter".into(), post_filter.to_json());
        }

        let buckets = self.resolve_buckets(container, request, &query, &query_filters)?;
        if !buckets.is_empty() {
            body.insert(
                "aggregations".into(),
                AggregationBuilder::new().build_all(&buckets),
            );
        }

        if !request.sort.is_empty() {
            let sort = SortBuilder::new(&self.field_mapper, container).build_all(&request.sort)?;
            body.insert("sort".into(), sort);
        }

        let collapse = request
            .collapse
            .clone()
            .or_else(|| container.collapse.as_ref().map(CollapseRequest::new));
        if let Some(ref collapse) = collapse {
            let clause = CollapseBuilder::new(&self.field_mapper, container).build(collapse)?;
            body.insert("collapse".into(), clause);
        }

        body.insert("from".into(), json!(request.from));
        body.insert("size".into(), json!(request.size));
        body.insert("track_total_hits".into(), json!(request.track_total_hits));

        debug!(
            container = %container.name,
            index = %container.index,
            buckets = buckets.len(),
            "compiled search request"
        );
        Ok(Value::Object(body))
    }
}
