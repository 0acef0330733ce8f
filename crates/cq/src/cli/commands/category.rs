//! Implementation of `cq category`.

use std::process::ExitCode;

use cq_search::{FieldMapper, VirtualRuleResolver, rule::ExcludedCategories};

use super::shared::load_categories;
use crate::cli::{
    args::CategoryCommand,
    context::CommandContext,
    output::{dim, header, print_json},
};

/// Resolves one category's membership rule and prints the resulting filter.
pub fn run(ctx: &CommandContext, cmd: &CategoryCommand) -> ExitCode {
    let container = match ctx.container(&cmd.container) {
        Ok(container) => container,
        Err(code) => return code,
    };
    let store = match load_categories(&cmd.categories) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let field_mapper = FieldMapper::from_config(&ctx.config);
    let resolver = VirtualRuleResolver::new(&store, &field_mapper, &container.mapping);
    let query = match resolver.resolve_id(cmd.id, &ExcludedCategories::new()) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return print_json(&query.to_json(), false);
    }

    println!(
        "{} {}",
        header(&format!("Category {}", cmd.id)),
        dim(&format!("({} categories loaded)", store.len()))
    );
    for line in query.to_string().lines() {
        println!("   {line}");
    }
    ExitCode::SUCCESS
}
