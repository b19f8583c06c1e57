//! Small helpers shared across the workspace crates.

pub mod config;
pub mod env;
pub mod tz;
