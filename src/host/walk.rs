//! Selection-or-page traversal.
//!
//! A non-empty selection narrows the walk to the selected subtrees;
//! otherwise every top-level node of the page is walked. Order is
//! depth-first pre-order. Each node is fetched fresh from the host when
//! it is reached, so edits made between steps are observed. A node is
//! yielded at most once, even if it is reachable twice (overlapping
//! selection, child cycle).

use hashbrown::HashSet;

use crate::model::{NodeId, SceneNode};
use crate::Result;
use super::HostBackend;

/// Which roots a walk started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    Selection,
    Page,
}

/// Pull-based pre-order walk over the host scene graph.
pub struct ScopeWalk<'h, H: HostBackend> {
    host: &'h H,
    scope: WalkScope,
    /// Pending node ids; the top of the stack is visited next.
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'h, H: HostBackend> ScopeWalk<'h, H> {
    /// Resolve the roots: the selection if non-empty, else the page.
    pub async fn start(host: &'h H) -> Result<Self> {
        let selection = host.selection().await?;
        let (scope, roots) = if selection.is_empty() {
            (WalkScope::Page, host.page_children().await?)
        } else {
            (WalkScope::Selection, selection)
        };
        tracing::debug!(?scope, roots = roots.len(), "starting scope walk");
        Ok(Self::from_roots(host, scope, roots))
    }

    fn from_roots(host: &'h H, scope: WalkScope, mut roots: Vec<NodeId>) -> Self {
        roots.reverse();
        Self { host, scope, stack: roots, visited: HashSet::new() }
    }

    pub fn scope(&self) -> WalkScope {
        self.scope
    }

    /// Next node in pre-order, or `None` when the walk is done.
    ///
    /// Ids that no longer resolve (deleted mid-walk) are skipped.
    pub async fn next(&mut self) -> Result<Option<SceneNode>> {
        while let Some(id) = self.stack.pop() {
            if self.visited.contains(&id) {
                continue;
            }
            let Some(node) = self.host.get_node(&id).await? else {
                tracing::debug!(node = %id, "node vanished during walk");
                continue;
            };
            self.visited.insert(id);
            if node.kind.supports_children() {
                let unseen = node.children.iter().rev().filter(|c| !self.visited.contains(*c));
                self.stack.extend(unseen.cloned());
            }
            return Ok(Some(node));
        }
        Ok(None)
    }
}
