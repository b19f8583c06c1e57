//! Canonical in-memory representation of a numeric time series.
//!
//! [`TimeSeries`] is the standard output of every [`DataParser`](crate::parsers::DataParser)
//! and the unit of data passed between transform stages.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::interval::TimeInterval;

/// A single time-stamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// The timestamp for this sample (UTC).
    pub timestamp: DateTime<Utc>,
    /// The measured value.
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Raised when a sample would break the strictly increasing timestamp order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("sample at {timestamp} does not follow {previous}")]
pub struct OutOfOrderError {
    pub previous: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// An ordered sequence of samples with strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Builds a series from samples that must already be in strictly increasing order.
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self, OutOfOrderError> {
        if let Some(w) = samples.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(OutOfOrderError {
                previous: w[0].timestamp,
                timestamp: w[1].timestamp,
            });
        }
        Ok(Self { samples })
    }

    /// Appends a sample after the current last one.
    pub fn push(&mut self, timestamp: DateTime<Utc>, value: f64) -> Result<(), OutOfOrderError> {
        if let Some(previous) = self.last_timestamp() {
            if timestamp <= previous {
                return Err(OutOfOrderError { previous, timestamp });
            }
        }
        self.samples.push(Sample { timestamp, value });
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Drops every sample outside `interval`.
    pub fn retain_within(&mut self, interval: &TimeInterval) {
        self.samples.retain(|s| interval.contains(s.timestamp));
    }
}
