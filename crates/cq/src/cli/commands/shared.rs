//! Shared helpers for the commands that compile a search.

use std::{fs, path::Path, process::ExitCode, str::FromStr, sync::Arc};

use cq_config::ContainerConfig;
use cq_query::QueryNode;
use cq_search::{
    FieldMapper, InMemoryCategoryStore, RequestMapper, SearchRequest, VocabularySpellchecker,
    request::CollapseRequest,
    rule::{Condition, condition_query},
};
use tracing::debug;

use crate::cli::{args::RequestArgs, context::CommandContext};

/// Builds the request mapper and the search request described by the command line.
pub fn prepare(
    ctx: &CommandContext,
    args: &RequestArgs,
) -> Result<(RequestMapper, SearchRequest), ExitCode> {
    let container = ctx.container(&args.container)?;
    let field_mapper = FieldMapper::from_config(&ctx.config);

    let mut request = SearchRequest::new(&args.container);
    if let Some(ref text) = args.text {
        request = match args.spelling {
            Some(spelling) => request.text_with_spelling(text, spelling),
            None => request.text(text),
        };
    }
    for expr in &args.filters {
        let (_, filter) = parse_condition(&field_mapper, container, expr)?;
        request = request.filter(filter);
    }
    for expr in &args.facets {
        let (attribute, filter) = parse_condition(&field_mapper, container, expr)?;
        request = request.facet_filter(attribute, filter);
    }
    if let Some(id) = args.category {
        request = request.category(id);
    }
    for order in &args.sort {
        request = request.sort(order.clone());
    }
    if let Some(ref field) = args.collapse {
        request = request.collapse(CollapseRequest::new(field));
    }
    request = request
        .page(args.from, args.size)
        .track_total_hits(!args.no_track_total_hits);

    let mut mapper = RequestMapper::new(Arc::clone(&ctx.config));
    if let Some(ref path) = args.vocabulary {
        let spellchecker = load_vocabulary(path)?;
        debug!(terms = spellchecker.len(), "loaded vocabulary");
        mapper = mapper.with_spellchecker(Arc::new(spellchecker));
    }
    if let Some(ref path) = args.categories {
        mapper = mapper.with_categories(Arc::new(load_categories(path)?));
    }
    Ok((mapper, request))
}

/// Parses a condition expression and compiles it against the container's mapping.
///
/// Returns the condition's attribute with the compiled filter.
fn parse_condition(
    field_mapper: &FieldMapper,
    container: &ContainerConfig,
    expr: &str,
) -> Result<(String, QueryNode), ExitCode> {
    let condition = Condition::from_str(expr).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })?;
    let filter = condition_query(field_mapper, &container.mapping, &condition);
    Ok((condition.attribute, filter))
}

/// Loads a whitespace-separated vocabulary file.
fn load_vocabulary(path: &Path) -> Result<VocabularySpellchecker, ExitCode> {
    let content = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        ExitCode::FAILURE
    })?;
    Ok(VocabularySpellchecker::new(content.split_whitespace()))
}

/// Loads a TOML file of category records.
pub fn load_categories(path: &Path) -> Result<InMemoryCategoryStore, ExitCode> {
    InMemoryCategoryStore::load(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })
}
