//! Data access layer for time-series visualization.
//!
//! Sources are reached through [`adapters::DataAdapter`] implementations, which expose
//! a lazily expanded catalogue ([`tree`]), download raw payloads and hand out a
//! matching [`parsers::DataParser`]. Parsed series flow through a
//! [`transform::TransformPipeline`] before being handed to the caller.

pub mod adapters;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod notify;
pub mod parsers;
pub mod requests;
pub mod transform;
pub mod tree;

pub use errors::Error;
