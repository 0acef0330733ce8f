//! Error types for cq configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A setting is outside its allowed range or inconsistent with the mapping.
    #[error("invalid configuration for {scope}: {message}")]
    Invalid {
        /// Scope of the invalid setting (`default` or `container '<name>'`).
        scope: String,
        /// Description of the problem.
        message: String,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    /// Creates a validation error for the given scope.
    pub(crate) fn invalid(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            scope: scope.into(),
            message: message.into(),
        }
    }
}
