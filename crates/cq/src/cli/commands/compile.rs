//! Implementation of `cq compile`.

use std::process::ExitCode;

use cq_search::{CompatibilityPass, ServerVersion};

use super::shared::prepare;
use crate::cli::{args::CompileCommand, context::CommandContext, output::print_json};

/// Compiles a search and prints the request body for the target server version.
pub fn run(ctx: &CommandContext, cmd: &CompileCommand) -> ExitCode {
    let (mapper, request) = match prepare(ctx, &cmd.request) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    let version = cmd
        .server_version
        .as_deref()
        .unwrap_or(&ctx.config.engine.server_version);
    let version: ServerVersion = match version.parse() {
        Ok(version) => version,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut body = match mapper.build(&request) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = CompatibilityPass::new(version).apply_request(&mut body) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    print_json(&body, cmd.compact)
}
