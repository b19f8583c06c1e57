use shared_utils::config::ConfigError;
use thiserror::Error;

use crate::{
    adapters::{AdapterError, RegistryError},
    models::interval::InvalidIntervalError,
    parsers::ParseError,
    transform::TransformError,
};

/// The unified error type for the `binjr_core` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A data adapter failed to talk to its source.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// An adapter could not be resolved or constructed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A downloaded payload could not be parsed.
    #[error("Failed to parse data for {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// A requested series has no matching column in the downloaded data.
    #[error("No column {column} in data for {path}")]
    MissingColumn { path: String, column: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Interval(#[from] InvalidIntervalError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
