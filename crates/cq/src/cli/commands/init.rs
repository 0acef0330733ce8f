//! Implementation of `cq init`.

use std::{fs, process::ExitCode};

use cq_config::{CONFIG_FILENAME, config_template};

use crate::cli::{
    args::InitCommand,
    context::CommandContext,
    output::{print_toml, subheader},
};

/// Writes a commented `.cq.toml` into the current directory.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let config_path = ctx.cwd.join(CONFIG_FILENAME);

    if config_path.exists() && !cmd.force {
        eprintln!(
            "error: configuration file already exists: {}",
            config_path.display()
        );
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    let template = config_template();
    if let Err(e) = fs::write(&config_path, &template) {
        eprintln!("error: failed to write {}: {e}", config_path.display());
        return ExitCode::FAILURE;
    }

    println!("Created {}", config_path.display());
    println!();
    println!("{}", subheader("Configuration written:"));
    print_toml(&template);
    ExitCode::SUCCESS
}
