//! Keys of the series mappings handed between pipeline stages.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::models::{binding::SeriesBinding, series::TimeSeries};

/// Pairs a [`SeriesBinding`] with the display state of one plotted series.
///
/// Used as the key identifying one series within a [`SeriesMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeSeriesInfo {
    binding: Arc<SeriesBinding>,
    display_name: String,
    color: Option<String>,
}

impl TimeSeriesInfo {
    pub fn new(binding: Arc<SeriesBinding>) -> Self {
        Self {
            display_name: binding.label().to_string(),
            color: binding.color().map(str::to_string),
            binding,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn binding(&self) -> &Arc<SeriesBinding> {
        &self.binding
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

/// Ordered mapping from series identity to series data.
pub type SeriesMap = IndexMap<TimeSeriesInfo, TimeSeries>;
