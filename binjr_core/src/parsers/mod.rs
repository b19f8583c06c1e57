//! Conversion of raw series payloads into [`TimeSeries`].
//!
//! A [`DataParser`] is obtained from the adapter that produced the payload, so it
//! already knows the payload's encoding, time zone and value conventions.

pub mod csv;
pub mod errors;
pub mod lines;
pub mod timestamp;

use std::{io::Read, num::ParseFloatError, sync::Arc};

use indexmap::IndexMap;

pub use csv::CsvParser;
pub use errors::ParseError;
pub use timestamp::{JRDS_TIMESTAMP_PATTERN, LocalTimestampParser, Rfc3339TimestampParser, TimestampParser};

use crate::models::series::TimeSeries;

/// Parsed series keyed by column name, in header order.
pub type ParsedSeries = IndexMap<String, TimeSeries>;

/// Converts the text of a value field into a number.
pub type ValueParser = Arc<dyn Fn(&str) -> Result<f64, ParseFloatError> + Send + Sync>;

/// Turns a raw payload into one series per value column.
pub trait DataParser: Send + Sync {
    /// Reads `input` to its end.
    ///
    /// An empty payload yields an empty map.
    fn parse(&self, input: &mut dyn Read) -> Result<ParsedSeries, ParseError>;
}

/// Parses a number, mapping NaN to `0.0`.
///
/// This is the legacy JRDS convention: a NaN sample is plotted as zero rather than as
/// a hole.
pub fn nan_as_zero(text: &str) -> Result<f64, ParseFloatError> {
    let v: f64 = text.trim().parse()?;
    Ok(if v.is_nan() { 0.0 } else { v })
}

/// Parses a number, keeping NaN.
pub fn keep_nan(text: &str) -> Result<f64, ParseFloatError> {
    text.trim().parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_strategies() {
        assert_eq!(nan_as_zero("NaN").unwrap(), 0.0);
        assert_eq!(nan_as_zero(" 1.5 ").unwrap(), 1.5);
        assert!(keep_nan("NaN").unwrap().is_nan());
        assert!(nan_as_zero("abc").is_err());
    }
}
