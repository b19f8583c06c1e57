use std::num::ParseFloatError;

use thiserror::Error;

use crate::models::series::OutOfOrderError;

/// Errors raised while turning a raw payload into time series.
///
/// Line numbers are 1-based and count the header.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error while reading series data: {0}")]
    Io(#[from] std::io::Error),

    /// The first line is blank, so there is no timestamp column.
    #[error("header line is blank")]
    EmptyHeader,

    #[error("column {name} appears more than once in the header")]
    DuplicateColumn { name: String },

    #[error("line {line}: expected {expected} fields, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid timestamp {value:?}: {source}")]
    Timestamp {
        line: usize,
        value: String,
        source: chrono::ParseError,
    },

    #[error("line {line}: invalid value {value:?} in column {column}: {source}")]
    Value {
        line: usize,
        column: String,
        value: String,
        source: ParseFloatError,
    },

    #[error("line {line}: {source}")]
    OutOfOrder {
        line: usize,
        source: OutOfOrderError,
    },
}
