//! Lazily populated catalogue tree.
//!
//! A branch whose children are not listed in the catalogue is created *deferred*: it
//! holds a single placeholder child so it renders as expandable, plus a
//! [`LeafLoader`] that fetches its real leaves on first expansion.
//!
//! Expansion is pull based. [`SourceTreeNode::try_expand`] flips an atomic guard
//! before calling the loader, so concurrent or repeated expansions fetch at most once.
//! A failed (or abandoned) fetch clears the guard and leaves the placeholder in place;
//! expanding again retries.

pub mod catalogue;

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tracing::debug;

use crate::{adapters::AdapterError, models::binding::SeriesBinding, notify::ErrorReporter};

/// Fetches the leaf bindings of a deferred branch.
#[async_trait]
pub trait LeafLoader: Send + Sync {
    async fn load_leaves(&self, path: &str) -> Result<Vec<SeriesBinding>, AdapterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Branch,
    Leaf,
    /// Stand-in child of a deferred branch that has not been expanded yet.
    Placeholder,
}

struct Deferred {
    expanded: AtomicBool,
    loader: Arc<dyn LeafLoader>,
}

/// Clears the expansion guard unless disarmed.
struct ResetOnDrop<'a> {
    flag: &'a AtomicBool,
    armed: bool,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(false, Ordering::Release);
        }
    }
}

/// A node of the catalogue tree.
pub struct SourceTreeNode {
    kind: NodeKind,
    binding: Option<Arc<SeriesBinding>>,
    children: Mutex<Vec<Arc<SourceTreeNode>>>,
    deferred: Option<Deferred>,
}

impl SourceTreeNode {
    /// A branch whose children are attached with [`SourceTreeNode::push_child`].
    pub fn branch(binding: SeriesBinding) -> Self {
        Self::new(NodeKind::Branch, Some(binding), None)
    }

    pub fn leaf(binding: SeriesBinding) -> Self {
        Self::new(NodeKind::Leaf, Some(binding), None)
    }

    /// A branch whose leaves are fetched by `loader` on first expansion.
    pub fn deferred(binding: SeriesBinding, loader: Arc<dyn LeafLoader>) -> Self {
        let node = Self::new(
            NodeKind::Branch,
            Some(binding),
            Some(Deferred {
                expanded: AtomicBool::new(false),
                loader,
            }),
        );
        node.lock_children().push(Arc::new(Self::placeholder()));
        node
    }

    fn placeholder() -> Self {
        Self::new(NodeKind::Placeholder, None, None)
    }

    fn new(kind: NodeKind, binding: Option<SeriesBinding>, deferred: Option<Deferred>) -> Self {
        Self {
            kind,
            binding: binding.map(Arc::new),
            children: Mutex::new(Vec::new()),
            deferred,
        }
    }

    fn lock_children(&self) -> MutexGuard<'_, Vec<Arc<SourceTreeNode>>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// `None` only for placeholders.
    pub fn binding(&self) -> Option<&Arc<SeriesBinding>> {
        self.binding.as_ref()
    }

    pub fn label(&self) -> &str {
        self.binding.as_ref().map_or("", |b| b.label())
    }

    pub fn push_child(&self, child: Arc<SourceTreeNode>) {
        self.lock_children().push(child);
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Arc<SourceTreeNode>> {
        self.lock_children().clone()
    }

    /// `true` for a deferred branch whose leaves have not been fetched.
    pub fn is_pending(&self) -> bool {
        self.deferred
            .as_ref()
            .is_some_and(|d| !d.expanded.load(Ordering::Acquire))
    }

    /// Fetches the leaves of a deferred branch, at most once.
    ///
    /// Returns `Ok(true)` when this call populated the node, `Ok(false)` when there was
    /// nothing to do (not deferred, already expanded, or expansion in flight elsewhere).
    pub async fn try_expand(&self) -> Result<bool, AdapterError> {
        let Some(deferred) = &self.deferred else {
            return Ok(false);
        };
        if deferred
            .expanded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        let mut guard = ResetOnDrop {
            flag: &deferred.expanded,
            armed: true,
        };

        let path = self.binding.as_ref().map_or("", |b| b.path());
        let leaves = deferred.loader.load_leaves(path).await?;
        debug!(path, leaves = leaves.len(), "Expanded deferred branch");

        let mut children = self.lock_children();
        children.retain(|c| c.kind != NodeKind::Placeholder);
        children.extend(leaves.into_iter().map(|b| Arc::new(SourceTreeNode::leaf(b))));
        guard.armed = false;
        Ok(true)
    }

    /// Expands the node, redirecting any failure to `reporter`.
    ///
    /// On failure the node keeps its placeholder and stays pending.
    pub async fn expand(&self, reporter: &dyn ErrorReporter) -> Vec<Arc<SourceTreeNode>> {
        if let Err(e) = self.try_expand().await {
            reporter.report_exception("Failed to retrieve graph description", &e);
        }
        self.children()
    }

    /// Bindings of every leaf currently attached below this node, depth first.
    pub fn leaves(&self) -> Vec<Arc<SeriesBinding>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<Arc<SeriesBinding>>) {
        if self.kind == NodeKind::Leaf {
            out.extend(self.binding.clone());
            return;
        }
        for child in self.children() {
            child.collect_leaves(out);
        }
    }

    /// Depth-first search for the first node whose binding has `path`.
    pub fn find(self: &Arc<Self>, path: &str) -> Option<Arc<SourceTreeNode>> {
        if self.binding.as_ref().is_some_and(|b| b.path() == path) {
            return Some(Arc::clone(self));
        }
        self.children().iter().find_map(|c| c.find(path))
    }

    /// Visits every node depth first with its depth, starting at 0.
    pub fn walk(&self, visit: &mut dyn FnMut(usize, &SourceTreeNode)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut dyn FnMut(usize, &SourceTreeNode)) {
        visit(depth, self);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::adapters::errors::StatusSnafu;

    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl LeafLoader for CountingLoader {
        async fn load_leaves(&self, path: &str) -> Result<Vec<SeriesBinding>, AdapterError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return StatusSnafu {
                    url: "http://h/graphdesc",
                    status: 500u16,
                    reason: "Internal Server Error",
                }
                .fail();
            }
            Ok(vec![
                SeriesBinding::new("in", path, "src").with_column(0),
                SeriesBinding::new("out", path, "src").with_column(1),
            ])
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl ErrorReporter for Collect {
        fn report_exception(&self, message: &str, cause: &(dyn std::error::Error + 'static)) {
            self.0.lock().unwrap().push(format!("{message}: {cause}"));
        }
    }

    fn deferred(fail_first: bool) -> (Arc<CountingLoader>, SourceTreeNode) {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_first,
        });
        let node = SourceTreeNode::deferred(SeriesBinding::new("eth0", "42", "src"), loader.clone());
        (loader, node)
    }

    #[tokio::test]
    async fn deferred_branch_starts_with_placeholder() {
        let (_, node) = deferred(false);
        let children = node.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), NodeKind::Placeholder);
        assert!(node.is_pending());
    }

    #[tokio::test]
    async fn re_expansion_is_idempotent() {
        let (loader, node) = deferred(false);
        let reporter = Collect::default();

        let first: Vec<String> = node.expand(&reporter).await.iter().map(|c| c.label().to_string()).collect();
        let second: Vec<String> = node.expand(&reporter).await.iter().map(|c| c.label().to_string()).collect();

        assert_eq!(first, vec!["in", "out"]);
        assert_eq!(first, second);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(!node.is_pending());
        assert!(reporter.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_expansion_fetches_once() {
        let (loader, node) = deferred(false);
        let (a, b) = tokio::join!(node.try_expand(), node.try_expand());
        assert_eq!(a.unwrap() as u8 + b.unwrap() as u8, 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.leaves().len(), 2);
    }

    #[tokio::test]
    async fn failed_expansion_is_reported_and_retryable() {
        let (loader, node) = deferred(true);
        let reporter = Collect::default();

        let children = node.expand(&reporter).await;
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), NodeKind::Placeholder);
        assert!(node.is_pending());
        assert_eq!(reporter.0.lock().unwrap().len(), 1);
        assert!(reporter.0.lock().unwrap()[0].contains("500"));

        let children = node.expand(&reporter).await;
        assert_eq!(children.len(), 2);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn find_and_walk() {
        let root = Arc::new(SourceTreeNode::branch(SeriesBinding::new("root", "/", "src")));
        let host = Arc::new(SourceTreeNode::branch(SeriesBinding::new("host", "h1", "src")));
        host.push_child(Arc::new(SourceTreeNode::leaf(SeriesBinding::new("cpu", "c1", "src"))));
        root.push_child(host);

        assert_eq!(root.find("c1").map(|n| n.label().to_string()).as_deref(), Some("cpu"));
        assert!(root.find("nope").is_none());

        let mut seen = Vec::new();
        root.walk(&mut |depth, n| seen.push((depth, n.label().to_string())));
        assert_eq!(seen, vec![(0, "root".into()), (1, "host".into()), (2, "cpu".into())]);
    }
}
