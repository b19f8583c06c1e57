//! Identity and metadata of one retrievable series.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

use crate::adapters::DataAdapter;

/// Non-owning handle from a binding back to the adapter that produced it.
pub type AdapterRef = Weak<dyn DataAdapter>;

/// Identifies one retrievable numeric series within a data source.
///
/// A binding is immutable once shared: the `with_*` methods consume and return the
/// value so they can only be used while it is being built. It never keeps its adapter
/// alive; [`SeriesBinding::adapter`] returns `None` once the adapter is dropped.
#[derive(Clone)]
pub struct SeriesBinding {
    label: String,
    path: String,
    source: String,
    column: Option<usize>,
    unit: Option<String>,
    graph_type: Option<String>,
    color: Option<String>,
    adapter: Option<AdapterRef>,
}

impl SeriesBinding {
    /// Creates a binding for `path` (slash-delimited, unique within `source`).
    pub fn new(label: impl Into<String>, path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            source: source.into(),
            column: None,
            unit: None,
            graph_type: None,
            color: None,
            adapter: None,
        }
    }

    pub fn with_adapter(mut self, adapter: AdapterRef) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Index of this sub-series among the value columns of the raw data stream.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_graph_type(mut self, graph_type: Option<String>) -> Self {
        self.graph_type = graph_type;
        self
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Display name of the adapter this binding was created by.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn graph_type(&self) -> Option<&str> {
        self.graph_type.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Address of the owning adapter, stable for as long as this binding exists.
    fn adapter_addr(&self) -> Option<usize> {
        self.adapter.as_ref().map(|a| a.as_ptr().cast::<()>() as usize)
    }

    /// Returns the owning adapter if it is still alive.
    pub fn adapter(&self) -> Option<Arc<dyn DataAdapter>> {
        self.adapter.as_ref().and_then(Weak::upgrade)
    }
}

impl PartialEq for SeriesBinding {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.path == other.path
            && self.column == other.column
            && self.label == other.label
            && self.adapter_addr() == other.adapter_addr()
    }
}

impl Eq for SeriesBinding {}

impl Hash for SeriesBinding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.path.hash(state);
        self.column.hash(state);
        self.label.hash(state);
        self.adapter_addr().hash(state);
    }
}

impl fmt::Debug for SeriesBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesBinding")
            .field("label", &self.label)
            .field("path", &self.path)
            .field("source", &self.source)
            .field("column", &self.column)
            .field("unit", &self.unit)
            .field("adapter_alive", &self.adapter().is_some())
            .finish()
    }
}
