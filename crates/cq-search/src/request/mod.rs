//! Search requests and their compilation into engine request bodies.

mod collapse;
mod mapper;
mod sort;

use std::{fmt, str::FromStr};

pub use collapse::CollapseBuilder;
use cq_query::QueryNode;
use indexmap::IndexMap;
pub use mapper::RequestMapper;
pub use sort::SortBuilder;

use crate::{ParseError, spellcheck::SpellingType};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Pseudo-field sorting by relevance score.
pub const SCORE_FIELD: &str = "_score";

/// The main query of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestQuery {
    /// Every document.
    MatchAll,
    /// Full-text query; the spelling is looked up when not given.
    Text {
        /// Query text.
        text: String,
        /// Spelling classification, if already known.
        spelling: Option<SpellingType>,
    },
    /// A prebuilt query.
    Node(QueryNode),
}

/// An abstract search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Container to search.
    pub container: String,
    /// Main query.
    pub query: RequestQuery,
    /// Virtual or plain category the results must belong to.
    pub category: Option<u64>,
    /// Structural filters restricting the query.
    pub query_filters: Vec<QueryNode>,
    /// Facet filters keyed by facet name, applied after aggregation.
    pub facet_filters: IndexMap<String, QueryNode>,
    /// Sort orders, most significant first.
    pub sort: Vec<SortOrder>,
    /// Result collapsing.
    pub collapse: Option<CollapseRequest>,
    /// Offset of the first hit.
    pub from: usize,
    /// Number of hits.
    pub size: usize,
    /// Whether the engine must count every match.
    pub track_total_hits: bool,
}

impl SearchRequest {
    /// Creates a match-all request on `container`.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            query: RequestQuery::MatchAll,
            category: None,
            query_filters: Vec::new(),
            facet_filters: IndexMap::new(),
            sort: Vec::new(),
            collapse: None,
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            track_total_hits: true,
        }
    }

    /// Sets a full-text query.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.query = RequestQuery::Text {
            text: text.into(),
            spelling: None,
        };
        self
    }

    /// Sets a full-text query with a known spelling.
    #[must_use]
    pub fn text_with_spelling(mut self, text: impl Into<String>, spelling: SpellingType) -> Self {
        self.query = RequestQuery::Text {
            text: text.into(),
            spelling: Some(spelling),
        };
        self
    }

    /// Sets a prebuilt query.
    #[must_use]
    pub fn query(mut self, query: QueryNode) -> Self {
        self.query = RequestQuery::Node(query);
        self
    }

    /// Restricts results to a category.
    #[must_use]
    pub fn category(mut self, id: u64) -> Self {
        self.category = Some(id);
        self
    }

    /// Adds a structural filter.
    #[must_use]
    pub fn filter(mut self, filter: QueryNode) -> Self {
        self.query_filters.push(filter);
        self
    }

    /// Adds or replaces a facet filter.
    #[must_use]
    pub fn facet_filter(mut self, name: impl Into<String>, filter: QueryNode) -> Self {
        self.facet_filters.insert(name.into(), filter);
        self
    }

    /// Appends a sort order.
    #[must_use]
    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    /// Collapses results on a field.
    #[must_use]
    pub fn collapse(mut self, collapse: CollapseRequest) -> Self {
        self.collapse = Some(collapse);
        self
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    /// Sets whether every match is counted.
    #[must_use]
    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = track;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Returns the engine name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Placement of documents without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Before the others.
    First,
    /// After the others.
    Last,
}

impl Missing {
    /// Returns the engine name of the placement.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "_first",
            Self::Last => "_last",
        }
    }
}

/// One sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortOrder {
    /// Logical field, or `_score`.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
    /// Placement of documents without a value.
    pub missing: Option<Missing>,
    /// Filter selecting which nested documents provide the sort value.
    pub nested_filter: Option<QueryNode>,
}

impl SortOrder {
    /// Sorts on a field.
    pub fn field(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            missing: None,
            nested_filter: None,
        }
    }

    /// Sorts by descending relevance.
    pub fn score() -> Self {
        Self::field(SCORE_FIELD, SortDirection::Desc)
    }

    /// Sets the placement of documents without a value.
    #[must_use]
    pub fn missing(mut self, missing: Missing) -> Self {
        self.missing = Some(missing);
        self
    }

    /// Sets the nested filter.
    #[must_use]
    pub fn nested_filter(mut self, filter: QueryNode) -> Self {
        self.nested_filter = Some(filter);
        self
    }
}

impl FromStr for SortOrder {
    type Err = ParseError;

    /// Parses `field`, `field:asc` or `field:desc`. Relevance defaults to descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.rsplit_once(':') {
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((_, other)) => {
                return Err(ParseError::UnknownSortDirection {
                    direction: other.to_string(),
                });
            }
            None if s == SCORE_FIELD => (s, SortDirection::Desc),
            None => (s, SortDirection::Asc),
        };
        if field.is_empty() {
            return Err(ParseError::MissingSortField {
                input: s.to_string(),
            });
        }
        Ok(Self::field(field, direction))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction.as_str())
    }
}

/// Result collapsing on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseRequest {
    /// Logical field to collapse on.
    pub field: String,
    /// Inner hits returned per collapsed group.
    pub inner_hits: Vec<InnerHits>,
}

impl CollapseRequest {
    /// Collapses on `field` without inner hits.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            inner_hits: Vec::new(),
        }
    }

    /// Adds an inner hits section.
    #[must_use]
    pub fn inner_hits(mut self, inner_hits: InnerHits) -> Self {
        self.inner_hits.push(inner_hits);
        self
    }
}

/// An inner hits section of a collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerHits {
    /// Section name.
    pub name: String,
    /// Number of hits.
    pub size: usize,
    /// Offset of the first hit.
    pub from: usize,
    /// Sort orders.
    pub sort: Vec<SortOrder>,
}

impl InnerHits {
    /// Creates an inner hits section.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            from: 0,
            sort: Vec::new(),
        }
    }
}
