//! Implementation of `cq config`.

use std::process::ExitCode;

use crate::cli::{context::CommandContext, output::print_toml};

/// Shows effective configuration settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    match ctx.config.settings_to_toml() {
        Ok(settings) => {
            print_toml(&settings);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize configuration: {e}");
            ExitCode::FAILURE
        }
    }
}
