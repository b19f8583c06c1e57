//! Descriptor of the sub-series produced by one monitored entity.
//!
//! The order of [`Graphdesc::series`] matches the value-column order of the raw data
//! stream for the same entity path; a sub-series is addressed by its index.

use std::io::BufRead;

use serde::Deserialize;

/// Graph type marking a sub-series that is not meant to be displayed.
pub const HIDDEN_GRAPH_TYPE: &str = "none";

/// Sub-series layout of one entity, as served by the `graphdesc` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename = "graphdesc")]
pub struct Graphdesc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "graphName", default)]
    pub graph_name: Option<String>,
    #[serde(rename = "graphTitle", default)]
    pub graph_title: Option<String>,
    #[serde(rename = "verticalLabel", default)]
    pub vertical_label: Option<String>,
    #[serde(rename = "add", default)]
    pub series: Vec<SeriesDesc>,
}

/// Rendering hints for one sub-series.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesDesc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "dsName", default)]
    pub ds_name: Option<String>,
    #[serde(rename = "graphType", default)]
    pub graph_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub legend: Option<String>,
}

impl Graphdesc {
    /// Deserializes a `<graphdesc>` document.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_reader(reader)
    }

    /// Builds a descriptor whose sub-series are named after the columns of a CSV
    /// header row; the first column holds timestamps and is skipped.
    pub fn from_header(header: &str, separator: char) -> Self {
        let series = header
            .split(separator)
            .skip(1)
            .map(|name| SeriesDesc {
                name: Some(name.trim().to_string()),
                ..Default::default()
            })
            .collect();
        Self {
            series,
            ..Default::default()
        }
    }

    /// Sub-series to expose as leaves, with their column index.
    pub fn visible_series(&self) -> impl Iterator<Item = (usize, &SeriesDesc)> {
        self.series.iter().enumerate().filter(|(_, d)| !d.is_hidden())
    }
}

impl SeriesDesc {
    /// Legend, else name, else data-store name.
    pub fn label(&self) -> &str {
        [&self.legend, &self.name, &self.ds_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("")
    }

    pub fn is_hidden(&self) -> bool {
        self.graph_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(HIDDEN_GRAPH_TYPE))
    }
}
