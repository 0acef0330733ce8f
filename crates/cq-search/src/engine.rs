//! Engine client boundary and the search pipeline built on it.

use std::sync::Arc;

use cq_config::{Config, ConfigStore, ContainerConfig};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    SearchError,
    aggregation::{
        AggregationResolver, ConfiguredAggregations, CoverageAggregations, CoverageRateFilter,
    },
    compat::{CompatibilityPass, ServerVersion},
    request::{RequestMapper, SearchRequest},
    response::{AttributeCoverage, ResponseMapper, SearchResponse},
    rule::CategoryStore,
    spellcheck::Spellchecker,
};

/// Errors reported by an engine client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("engine transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The engine rejected the request.
    #[error("engine returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// Executes compiled requests.
pub trait EngineClient: Send + Sync {
    /// Runs a search request body against `index` and returns the raw response.
    fn search(&self, index: &str, body: &Value) -> Result<Value, EngineError>;

    /// Returns the version of the server.
    fn server_version(&self) -> Result<ServerVersion, EngineError>;
}

/// Compiles, adapts, runs and maps searches.
///
/// Each search takes one configuration snapshot and uses it start to finish.
pub struct SearchService {
    /// Configuration source.
    store: Arc<ConfigStore>,
    /// Engine the requests run on.
    client: Arc<dyn EngineClient>,
    /// Spelling lookup for text queries.
    spellchecker: Option<Arc<dyn Spellchecker>>,
    /// Category records for category restrictions.
    categories: Option<Arc<dyn CategoryStore>>,
}

impl SearchService {
    /// Creates a service.
    pub fn new(store: Arc<ConfigStore>, client: Arc<dyn EngineClient>) -> Self {
        Self {
            store,
            client,
            spellchecker: None,
            categories: None,
        }
    }

    /// Sets the spellchecker.
    #[must_use]
    pub fn with_spellchecker(mut self, spellchecker: Arc<dyn Spellchecker>) -> Self {
        self.spellchecker = Some(spellchecker);
        self
    }

    /// Sets the category store.
    #[must_use]
    pub fn with_categories(mut self, categories: Arc<dyn CategoryStore>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Runs a search.
    ///
    /// Containers with facet coverage thresholds first run a coverage search and drop facets
    /// too few matching documents carry.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let config = self.store.snapshot();
        let pass = CompatibilityPass::new(self.server_version(&config)?);
        let container = config
            .container(&request.container)
            .ok_or_else(|| SearchError::UnknownContainer {
                name: request.container.clone(),
            })?;

        let base = self.mapper(Arc::clone(&config));
        let aggregations = if has_coverage_thresholds(container) {
            let coverage = self.coverage(&config, request, &pass)?;
            AggregationResolver::new().with_provider(CoverageRateFilter::new(
                ConfiguredAggregations::new(base.field_mapper().clone()),
                coverage,
            ))
        } else {
            AggregationResolver::new()
                .with_provider(ConfiguredAggregations::new(base.field_mapper().clone()))
        };
        let mapper = base.with_aggregations(aggregations);

        let raw = self.run(&mapper, request, &pass)?;
        ResponseMapper::new().map(&raw)
    }

    /// Runs the coverage search of a request.
    fn coverage(
        &self,
        config: &Arc<Config>,
        request: &SearchRequest,
        pass: &CompatibilityPass,
    ) -> Result<AttributeCoverage, SearchError> {
        let mut coverage_request = request.clone().page(0, 0);
        coverage_request.sort.clear();
        coverage_request.collapse = None;

        let mapper = self
            .mapper(Arc::clone(config))
            .with_aggregations(AggregationResolver::new().with_provider(CoverageAggregations));
        let raw = self.run(&mapper, &coverage_request, pass)?;
        let coverage = AttributeCoverage::from_response(&ResponseMapper::new().map(&raw)?);
        debug!(total = coverage.total(), "measured attribute coverage");
        Ok(coverage)
    }

    /// Compiles, adapts and runs one request.
    fn run(
        &self,
        mapper: &RequestMapper,
        request: &SearchRequest,
        pass: &CompatibilityPass,
    ) -> Result<Value, SearchError> {
        let index = mapper.index_name(request)?;
        let mut body = mapper.build(request)?;
        pass.apply_request(&mut body)?;
        debug!(%index, version = %pass.version(), "running search");
        Ok(self.client.search(index, &body)?)
    }

    /// Returns the configured server version, asking the engine when none parses.
    fn server_version(&self, config: &Config) -> Result<ServerVersion, SearchError> {
        match config.engine.server_version.parse() {
            Ok(version) => Ok(version),
            Err(err) => {
                debug!(%err, "asking the engine for its version");
                Ok(self.client.server_version()?)
            }
        }
    }

    /// Creates a request mapper over a snapshot.
    fn mapper(&self, config: Arc<Config>) -> RequestMapper {
        let mut mapper = RequestMapper::new(config);
        if let Some(ref spellchecker) = self.spellchecker {
            mapper = mapper.with_spellchecker(Arc::clone(spellchecker));
        }
        if let Some(ref categories) = self.categories {
            mapper = mapper.with_categories(Arc::clone(categories));
        }
        mapper
    }
}

/// Returns whether any bucket of the container sits on a field with a coverage threshold.
fn has_coverage_thresholds(container: &ContainerConfig) -> bool {
    container
        .aggregations
        .iter()
        .filter_map(|bucket| bucket.field.as_deref())
        .filter_map(|field| container.mapping.field(field))
        .any(|definition| definition.facet_min_coverage_rate > 0.0)
}
