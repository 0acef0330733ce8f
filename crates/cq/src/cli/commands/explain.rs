//! Implementation of `cq explain`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use cq_query::QueryNode;
use cq_search::{
    RequestMapper, SearchError, SearchRequest,
    aggregation::{BucketKind, BucketRequest},
};
use indexmap::IndexMap;

use super::shared::prepare;
use crate::cli::{
    args::ExplainCommand,
    context::CommandContext,
    output::{dim, header, subheader},
};

/// Prints the query tree and the buckets a search compiles to.
pub fn run(ctx: &CommandContext, cmd: &ExplainCommand) -> ExitCode {
    let (mapper, request) = match prepare(ctx, &cmd.request) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    let (query, buckets) = match compile(&mapper, &request) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let container = &cmd.request.container;
    println!("{}", header(&format!("Container {container}")));
    println!();
    println!("{}", subheader("Query:"));
    for line in query.to_string().lines() {
        println!("   {line}");
    }
    println!();

    println!("{}", subheader("Buckets:"));
    if buckets.is_empty() {
        println!("   {}", dim("(none)"));
        return ExitCode::SUCCESS;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Name", "Kind", "Field", "Nested", "Filtered"]);
    for bucket in buckets.values() {
        table.add_row(vec![
            Cell::new(&bucket.name),
            Cell::new(kind_label(bucket)),
            Cell::new(bucket.field().unwrap_or("-")),
            Cell::new(bucket.nested_path.as_deref().unwrap_or("-")),
            Cell::new(if bucket.filter.is_some() { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}

/// Compiles the query and resolves the buckets of a request.
fn compile(
    mapper: &RequestMapper,
    request: &SearchRequest,
) -> Result<(QueryNode, IndexMap<String, BucketRequest>), SearchError> {
    Ok((mapper.compile_query(request)?, mapper.buckets(request)?))
}

/// Describes a bucket's kind with its main parameter.
fn kind_label(bucket: &BucketRequest) -> String {
    match bucket.kind {
        BucketKind::Term { size: 0, .. } => "term (unbounded)".to_string(),
        BucketKind::Term { size, .. } => format!("term ({size})"),
        BucketKind::Histogram { interval, .. } => format!("histogram ({interval})"),
        BucketKind::QueryGroup { ref queries } => format!("query group ({})", queries.len()),
    }
}
