use std::sync::Weak;

use async_trait::async_trait;

use super::JrdsDataAdapter;
use crate::{
    adapters::{AdapterError, errors::AdapterReleasedSnafu},
    models::binding::SeriesBinding,
    tree::LeafLoader,
};

/// Fetches a graph's descriptor when its tree node is first expanded.
pub struct GraphdescLoader {
    adapter: Weak<JrdsDataAdapter>,
}

impl GraphdescLoader {
    pub fn new(adapter: Weak<JrdsDataAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl LeafLoader for GraphdescLoader {
    async fn load_leaves(&self, path: &str) -> Result<Vec<SeriesBinding>, AdapterError> {
        let Some(adapter) = self.adapter.upgrade() else {
            return AdapterReleasedSnafu { path }.fail();
        };
        let desc = adapter.graph_descriptor(path).await?;
        Ok(adapter.leaf_bindings(&desc, path))
    }
}
