//! Flat JSON catalogue decoding and tree assembly.
//!
//! The catalogue is a flat `items` array. Items of type `tree` are roots; any item
//! may list children by reference to another item's id.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

use super::SourceTreeNode;

/// Item type marking a root of the catalogue.
pub const ROOT_ITEM_TYPE: &str = "tree";

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("item with a blank id")]
    BlankId,

    #[error("duplicate item id {0}")]
    DuplicateId(String),

    #[error("item {parent} references unknown child {child}")]
    MissingReference { parent: String, child: String },

    #[error("reference cycle through item {0}")]
    Cycle(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalogue {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub items: Vec<CatalogueItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<ChildRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildRef {
    #[serde(rename = "_reference")]
    pub reference: String,
}

impl CatalogueItem {
    /// Items without listed children have their leaves fetched on demand.
    pub fn is_deferred(&self) -> bool {
        self.children.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Reduces a dotted item id to its last segment.
///
/// Fails on ids that are blank or end with a dot.
pub fn normalize_id(id: &str) -> Result<&str, CatalogueError> {
    let last = id.rsplit('.').next().unwrap_or(id).trim();
    if last.is_empty() {
        return Err(CatalogueError::BlankId);
    }
    Ok(last)
}

impl Catalogue {
    pub fn from_slice(payload: &[u8]) -> Result<Self, CatalogueError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Attaches one subtree per root item below `root`, in catalogue order.
    ///
    /// `make_node` receives each item with its normalized path and returns the node to
    /// attach; children referenced by the item are attached under it.
    pub fn attach_to<F>(&self, root: &SourceTreeNode, mut make_node: F) -> Result<(), CatalogueError>
    where
        F: FnMut(&CatalogueItem, &str) -> SourceTreeNode,
    {
        let mut by_id = HashMap::with_capacity(self.items.len());
        for item in &self.items {
            if item.id.trim().is_empty() {
                return Err(CatalogueError::BlankId);
            }
            if by_id.insert(item.id.as_str(), item).is_some() {
                return Err(CatalogueError::DuplicateId(item.id.clone()));
            }
        }

        let mut visiting = HashSet::new();
        for item in self
            .items
            .iter()
            .filter(|i| i.kind.as_deref() == Some(ROOT_ITEM_TYPE))
        {
            let node = attach(item, &by_id, &mut visiting, &mut make_node)?;
            root.push_child(node);
        }
        Ok(())
    }
}

fn attach<'a, F>(
    item: &'a CatalogueItem,
    by_id: &HashMap<&str, &'a CatalogueItem>,
    visiting: &mut HashSet<&'a str>,
    make_node: &mut F,
) -> Result<Arc<SourceTreeNode>, CatalogueError>
where
    F: FnMut(&CatalogueItem, &str) -> SourceTreeNode,
{
    if !visiting.insert(item.id.as_str()) {
        return Err(CatalogueError::Cycle(item.id.clone()));
    }
    let node = Arc::new(make_node(item, normalize_id(&item.id)?));
    for child in item.children.iter().flatten() {
        let child_item =
            by_id
                .get(child.reference.as_str())
                .ok_or_else(|| CatalogueError::MissingReference {
                    parent: item.id.clone(),
                    child: child.reference.clone(),
                })?;
        node.push_child(attach(child_item, by_id, visiting, make_node)?);
    }
    visiting.remove(item.id.as_str());
    Ok(node)
}
