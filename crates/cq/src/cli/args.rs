//! Clap argument definitions for the `cq` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cq_search::{SortOrder, SpellingType};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "cq")]
#[command(about = "Catalog search request compiler")]
pub struct Cli {
    /// Configuration file to use instead of discovery (repeatable, highest precedence first)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Vec<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); CQ_LOG overrides
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported `cq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Compile a search into an engine request body
    Compile(CompileCommand),

    /// Show the query tree and buckets a search compiles to
    Explain(ExplainCommand),

    /// Resolve a category's membership rule
    Category(CategoryCommand),

    /// Normalize a raw engine response
    Response(ResponseCommand),

    /// Show effective configuration
    Config,

    /// Validate configuration and report warnings
    Check,

    /// Create a commented .cq.toml in the current directory
    Init(InitCommand),
}

/// Flags describing one search, shared by `compile` and `explain`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Full-text query; omit to match every document
    pub text: Option<String>,

    /// Container to search
    #[arg(short = 'C', long, default_value = "catalog")]
    pub container: String,

    /// Spelling type of the text (exact, most_exact, fuzzy, most_fuzzy, pure_stopwords)
    #[arg(short = 's', long)]
    pub spelling: Option<SpellingType>,

    /// Whitespace-separated word list used to classify the text's spelling
    #[arg(long, value_name = "FILE")]
    pub vocabulary: Option<PathBuf>,

    /// Structural filter such as `color==red` or `price>=10` (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Facet filter applied after aggregation, such as `color==red` (repeatable)
    #[arg(long = "facet", value_name = "EXPR")]
    pub facets: Vec<String>,

    /// Restrict results to a category
    #[arg(long)]
    pub category: Option<u64>,

    /// TOML file with [[category]] records
    #[arg(long, value_name = "FILE")]
    pub categories: Option<PathBuf>,

    /// Sort order `field[:asc|:desc]` (repeatable, most significant first)
    #[arg(long = "sort", value_name = "ORDER")]
    pub sort: Vec<SortOrder>,

    /// Collapse results on a field
    #[arg(long, value_name = "FIELD")]
    pub collapse: Option<String>,

    /// Offset of the first hit
    #[arg(long, default_value = "0")]
    pub from: usize,

    /// Number of hits
    #[arg(short = 'n', long, default_value = "20")]
    pub size: usize,

    /// Do not ask the engine to count every match
    #[arg(long)]
    pub no_track_total_hits: bool,
}

/// Arguments for `cq compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    #[command(flatten)]
    /// Search description.
    pub request: RequestArgs,

    /// Server version to compile for [default: engine.server_version from config]
    #[arg(long, value_name = "VERSION")]
    pub server_version: Option<String>,

    /// Print JSON on one line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for `cq explain`.
#[derive(Args, Debug, Clone)]
pub struct ExplainCommand {
    #[command(flatten)]
    /// Search description.
    pub request: RequestArgs,
}

/// Arguments for `cq category`.
#[derive(Args, Debug, Clone)]
pub struct CategoryCommand {
    /// Category id
    pub id: u64,

    /// TOML file with [[category]] records
    #[arg(long, value_name = "FILE", required = true)]
    pub categories: PathBuf,

    /// Container whose mapping resolves rule attributes
    #[arg(short = 'C', long, default_value = "catalog")]
    pub container: String,

    /// Print the engine JSON instead of the tree
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cq response`.
#[derive(Args, Debug, Clone)]
pub struct ResponseCommand {
    /// File with the raw engine response, or `-` for stdin
    #[arg(default_value = "-")]
    pub file: String,

    /// Output the normalized response as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_compile_flags() {
        let cli = Cli::try_parse_from([
            "cq",
            "compile",
            "red shoes",
            "--spelling",
            "most-fuzzy",
            "--filter",
            "color==red",
            "--sort",
            "price:desc",
            "-n",
            "5",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Compile(cmd) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(cmd.request.text.as_deref(), Some("red shoes"));
        assert_eq!(cmd.request.spelling, Some(SpellingType::MostFuzzy));
        assert_eq!(cmd.request.filters, ["color==red"]);
        assert_eq!(cmd.request.sort[0].to_string(), "price:desc");
        assert_eq!(cmd.request.size, 5);
    }
}
