use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// Raised when an interval's end precedes its beginning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid interval: begin {begin} is after end {end}")]
pub struct InvalidIntervalError {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A half-open time range `[begin, end)`.
///
/// `begin == end` is a valid, empty interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidIntervalError> {
        if begin > end {
            return Err(InvalidIntervalError { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// The interval of length `span` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, span: TimeDelta) -> Result<Self, InvalidIntervalError> {
        Self::new(end - span, end)
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// `true` when `begin <= ts < end`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.begin <= ts && ts < self.end
    }
}
