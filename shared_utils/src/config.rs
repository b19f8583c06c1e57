use std::path::PathBuf;

use thiserror::Error;

use crate::env::MissingEnvVarError;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A single setting holds a value that cannot be used.
    #[error("Invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },
}
