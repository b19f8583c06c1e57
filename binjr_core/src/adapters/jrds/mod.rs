//! Adapter for JRDS performance-monitoring servers.
//!
//! JRDS exposes three endpoints below its base URL:
//! - `jsontree?tab=<filter>`: the catalogue as a flat JSON item list,
//! - `graphdesc?id=<id>`: the sub-series layout of one graph as XML (absent on old
//!   servers, which answer 404),
//! - `download?id=<id>&begin=<ms>&end=<ms>`: raw samples as comma separated text.

pub mod adapter;
pub mod loader;
pub mod params;

pub use adapter::JrdsDataAdapter;
pub use params::JrdsTreeFilter;

/// Registry key of the JRDS adapter.
pub const ADAPTER_KEY: &str = "jrds";

/// Length of the download window used to discover column names on servers without
/// the `graphdesc` endpoint.
pub const LEGACY_PROBE_SECONDS: i64 = 120;
