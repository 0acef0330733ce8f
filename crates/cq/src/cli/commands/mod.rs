//! Command implementations and dispatch.

pub mod category;
pub mod check;
pub mod compile;
pub mod config;
pub mod explain;
pub mod init;
pub mod response;
mod shared;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Compile(cmd) => compile::run(ctx, &cmd),
        Commands::Explain(cmd) => explain::run(ctx, &cmd),
        Commands::Category(cmd) => category::run(ctx, &cmd),
        Commands::Response(cmd) => response::run(&cmd),
        Commands::Config => config::run(ctx),
        Commands::Check => check::run(ctx),
        Commands::Init(cmd) => init::run(ctx, &cmd),
    }
}
