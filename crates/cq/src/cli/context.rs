//! Shared context for running CLI commands.

use std::{env, path::PathBuf, process::ExitCode, sync::Arc};

use cq_config::{Config, ContainerConfig, discover_config_files};

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Arc<Config>,
    /// Files the configuration was loaded from, highest precedence first.
    pub config_files: Vec<PathBuf>,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    ///
    /// Explicit `--config` files replace discovery.
    pub fn load(explicit: &[PathBuf]) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config_files = if explicit.is_empty() {
            discover_config_files(&cwd)
        } else {
            explicit.to_vec()
        };
        let config = load_config_or_failure(&config_files)?;
        Ok(Self {
            cwd,
            config: Arc::new(config),
            config_files,
        })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which must work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Arc::new(Config::default()),
            config_files: Vec::new(),
        })
    }

    /// Looks up a container, printing the known names when it is missing.
    pub fn container(&self, name: &str) -> Result<&ContainerConfig, ExitCode> {
        if let Some(container) = self.config.container(name) {
            return Ok(container);
        }
        eprintln!("error: unknown container '{name}'");
        if self.config.containers.is_empty() {
            eprintln!("Run 'cq init' to create a configuration file, then define a container.");
        } else {
            let known: Vec<&str> = self.config.containers.keys().map(String::as_str).collect();
            eprintln!("known containers: {}", known.join(", "));
        }
        Err(ExitCode::FAILURE)
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the given files or exits with an error.
fn load_config_or_failure(files: &[PathBuf]) -> Result<Config, ExitCode> {
    if let Some(missing) = files.iter().find(|path| !path.exists()) {
        eprintln!("error: config file not found: {}", missing.display());
        return Err(ExitCode::FAILURE);
    }
    Config::load_from_files(files).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
