//! Implementation of `cq check`.

use std::process::ExitCode;

use cq_config::{ConfigWarning, is_global_config};

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Lists configuration files and containers, then reports validation warnings.
///
/// Exits with failure when there is anything to fix.
pub fn run(ctx: &CommandContext) -> ExitCode {
    if ctx.config_files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!("Run {} to create a configuration file.", subheader("cq init"));
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader("Config files:"));
    for path in &ctx.config_files {
        let display = path
            .strip_prefix(&ctx.cwd)
            .unwrap_or(path)
            .display()
            .to_string();
        if is_global_config(path) {
            println!("   {display} {}", dim("(global)"));
        } else {
            println!("   {display}");
        }
    }
    println!();

    let config = &ctx.config;
    println!("{}", subheader("Containers:"));
    if config.containers.is_empty() {
        println!("   {}", dim("(none defined)"));
    }
    for container in config.containers.values() {
        println!(
            "   {} {}",
            container.name,
            dim(&format!(
                "-> {} ({} fields, {} buckets)",
                container.index,
                container.mapping.fields.len(),
                container.aggregations.len()
            ))
        );
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("   {}", warning(&w.to_string()));
    }
    println!();

    print_hints(&warnings);

    ExitCode::FAILURE
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    for w in warnings {
        let hint = match w {
            ConfigWarning::NoContainersDefined => "add [container.NAME] sections to .cq.toml",
            ConfigWarning::NoSearchableFields { .. } => {
                "declare text fields with a weight, or set searchable = true"
            }
            ConfigWarning::UndeclaredBucketField { .. } => {
                "declare the field under [container.NAME.field.FIELD]"
            }
            ConfigWarning::NoSpellcheckFields { .. } => {
                "set spellcheck = true on the fields the spellchecker should read"
            }
        };
        println!("{}", dim(&format!("Hint: {hint}")));
    }
}
