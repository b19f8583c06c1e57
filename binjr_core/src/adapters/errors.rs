use shared_utils::config::ConfigError;
use snafu::{Backtrace, Snafu};

use crate::{adapters::transport::TransportError, models::interval::InvalidIntervalError};

/// Errors raised by a [`DataAdapter`](crate::adapters::DataAdapter) while talking to its source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AdapterError {
    /// The request could not be sent or its body could not be read.
    #[snafu(display("Error executing HTTP request [{url}]: {source}"))]
    Transport {
        url: String,
        source: TransportError,
        backtrace: Backtrace,
    },

    /// The source answered with a non-success status.
    #[snafu(display("Unexpected response status from [{url}]: {status} - {reason}"))]
    Status {
        url: String,
        status: u16,
        reason: String,
        backtrace: Backtrace,
    },

    /// The catalogue payload could not be decoded or is inconsistent.
    #[snafu(display("Malformed catalogue in response to [{url}]: {message}"))]
    MalformedCatalogue {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The graph descriptor could not be decoded.
    #[snafu(display("Malformed graph descriptor in response to [{url}]: {source}"))]
    MalformedDescriptor {
        url: String,
        source: quick_xml::DeError,
        backtrace: Backtrace,
    },

    /// Sub-series names could not be derived from a probe download.
    #[snafu(display("Could not retrieve data store names for graph id={path}: {message}"))]
    LegacyHeader {
        path: String,
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("{source}"))]
    InvalidInterval {
        source: InvalidIntervalError,
        backtrace: Backtrace,
    },

    #[snafu(display("Error building URI for request: {message}"))]
    Url {
        message: String,
        backtrace: Backtrace,
    },

    /// Writing the response body to the caller's sink failed.
    #[snafu(display("Failed to write response body: {source}"))]
    Sink {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The adapter behind a binding or tree node has been dropped.
    #[snafu(display("The data adapter serving {path} is no longer available"))]
    AdapterReleased { path: String, backtrace: Backtrace },
}

impl AdapterError {
    /// HTTP status carried by the error, if it was caused by one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while resolving or constructing adapters from the registry.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// No adapter is registered under the requested key.
    #[snafu(display("Could not find a registered adapter for key {key}"))]
    NoAdapterFound { key: String },

    /// The adapter constructor rejected its configuration.
    #[snafu(display("Could not create instance of adapter {key}: {source}"))]
    CannotInitializeAdapter { key: String, source: ConfigError },
}
