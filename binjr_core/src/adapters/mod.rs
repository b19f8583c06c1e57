//! Data adapter abstraction for remote time-series sources.
//!
//! This module defines the [`DataAdapter`] trait, the unified interface every
//! source protocol implements to enumerate its catalogue, download raw samples and
//! describe how those samples must be parsed.
//!
//! Each concrete adapter (such as [`jrds::JrdsDataAdapter`]) handles its own
//! request layout and payload formats. The trait is async and object safe so adapters
//! can be selected at runtime from the [`registry`].
//!
//! # Example
//!
//! ```rust
//! use std::{io::Write, sync::Arc};
//!
//! use async_trait::async_trait;
//! use binjr_core::adapters::{AdapterError, DataAdapter, TreeFilter};
//! use binjr_core::parsers::{CsvParser, DataParser};
//! use binjr_core::tree::SourceTreeNode;
//! use binjr_core::models::binding::SeriesBinding;
//! use chrono::{DateTime, Utc};
//!
//! struct NullAdapter;
//!
//! #[async_trait]
//! impl DataAdapter for NullAdapter {
//!     async fn binding_tree(&self, _filter: &TreeFilter) -> Result<Arc<SourceTreeNode>, AdapterError> {
//!         Ok(Arc::new(SourceTreeNode::branch(SeriesBinding::new("null", "/", self.source_name()))))
//!     }
//!
//!     async fn get_data(
//!         &self,
//!         _path: &str,
//!         _begin: DateTime<Utc>,
//!         _end: DateTime<Utc>,
//!         _sink: &mut (dyn Write + Send),
//!     ) -> Result<u64, AdapterError> {
//!         Ok(0)
//!     }
//!
//!     fn encoding(&self) -> &'static encoding_rs::Encoding {
//!         encoding_rs::UTF_8
//!     }
//!
//!     fn time_zone(&self) -> chrono_tz::Tz {
//!         chrono_tz::UTC
//!     }
//!
//!     fn parser(&self) -> Box<dyn DataParser> {
//!         Box::new(CsvParser::jrds(self.encoding(), self.time_zone()))
//!     }
//!
//!     fn source_name(&self) -> String {
//!         "[NULL] localhost:0 (UTC)".to_string()
//!     }
//!
//!     fn default_filter(&self) -> TreeFilter {
//!         TreeFilter::new("all")
//!     }
//! }
//! ```

pub mod errors;
pub mod jrds;
pub mod registry;
pub mod transport;

use std::{fmt, io::Write, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use encoding_rs::Encoding;

pub use errors::{AdapterError, RegistryError};

use crate::{parsers::DataParser, tree::SourceTreeNode};

/// Selects which view of a source's catalogue is enumerated.
///
/// The meaning of the command string is adapter specific.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeFilter(String);

impl TreeFilter {
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn command(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a request for an optional resource.
///
/// `NotFound` is a recognized answer, distinct from a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

/// Connector to one external time-series source.
///
/// Implement this trait once per source protocol. Adapters are shared as
/// `Arc<dyn DataAdapter>`; the bindings they create only hold weak references back.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Retrieves the source's catalogue and builds its lazily expandable tree.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] if the catalogue cannot be retrieved or decoded.
    async fn binding_tree(&self, filter: &TreeFilter) -> Result<Arc<SourceTreeNode>, AdapterError>;

    /// Downloads the raw samples of `path` over `[begin, end)` into `sink`.
    ///
    /// Returns the number of bytes written. `begin == end` writes nothing and is not an
    /// error; `begin > end` fails with [`AdapterError::InvalidInterval`].
    async fn get_data(
        &self,
        path: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        sink: &mut (dyn Write + Send),
    ) -> Result<u64, AdapterError>;

    /// Character encoding of the payloads served by the source.
    fn encoding(&self) -> &'static Encoding;

    /// Time zone in which the source records timestamps.
    fn time_zone(&self) -> Tz;

    /// A parser bound to this adapter's encoding, zone and value conventions.
    fn parser(&self) -> Box<dyn DataParser>;

    /// Human readable identity, embedding host, port and zone.
    fn source_name(&self) -> String;

    /// Catalogue view used when the caller does not pick one.
    fn default_filter(&self) -> TreeFilter;
}
