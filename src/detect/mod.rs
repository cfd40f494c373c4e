//! Issue detection.
//!
//! One pass = fetch the category's tokens through the cache, build a
//! value index, walk the selection-or-page scope in pre-order and apply the
//! category's policy to each node. With an annotator attached, every issue
//! gets a marker as it is found.

pub mod policy;

use std::collections::BTreeSet;

use crate::host::{HostBackend, ScopeWalk};
use crate::markers::MarkerAnnotator;
use crate::model::{Category, Issue, NodeId};
use crate::tokens::{TokenCache, TokenIndex};
use crate::Result;

pub use policy::{radius_issues, spacing_issues, NodeIssues};

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub category: Category,
    pub issues: Vec<Issue>,
    pub nodes_scanned: usize,
}

impl DetectionReport {
    pub fn count(&self) -> usize {
        self.issues.len()
    }

    pub fn fixable_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_fixable()).count()
    }

    pub fn unfixable_count(&self) -> usize {
        self.count() - self.fixable_count()
    }

    /// Distinct nodes carrying at least one issue.
    pub fn affected_nodes(&self) -> BTreeSet<NodeId> {
        self.issues.iter().map(|i| i.node_id.clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.affected_nodes().len()
    }
}

/// Runs detection passes against one host.
pub struct IssueDetector<'a, H: HostBackend> {
    host: &'a H,
    cache: &'a TokenCache,
    annotator: Option<&'a MarkerAnnotator>,
}

impl<'a, H: HostBackend> IssueDetector<'a, H> {
    pub fn new(host: &'a H, cache: &'a TokenCache) -> Self {
        Self { host, cache, annotator: None }
    }

    /// Draw a marker for every issue found.
    pub fn with_markers(mut self, annotator: &'a MarkerAnnotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub async fn detect(&self, category: Category, collection: Option<&str>) -> Result<DetectionReport> {
        let tokens = self.cache.get_tokens(self.host, category, collection, false).await;
        let index = TokenIndex::build(&tokens);

        let mut walk = ScopeWalk::start(self.host).await?;
        let mut issues = Vec::new();
        let mut nodes_scanned = 0;

        while let Some(node) = walk.next().await? {
            nodes_scanned += 1;
            let found = match category {
                Category::Spacing => spacing_issues(&node, &index),
                Category::BorderRadius => radius_issues(&node, &index),
            };
            for issue in found {
                tracing::debug!(node = %issue.node_id, property = %issue.property, value = issue.value, fixable = issue.is_fixable(), "issue");
                if let Some(annotator) = self.annotator {
                    if let Err(err) = annotator.mark(self.host, &node, issue.is_fixable(), category).await {
                        tracing::warn!(node = %node.id, %err, "failed to draw marker");
                    }
                }
                issues.push(issue);
            }
        }

        let report = DetectionReport { category, issues, nodes_scanned };
        tracing::info!(
            %category,
            scope = ?walk.scope(),
            tokens = tokens.len(),
            nodes = nodes_scanned,
            issues = report.count(),
            fixable = report.fixable_count(),
            "detection finished"
        );
        Ok(report)
    }

    /// Spacing and radius passes run concurrently on the current task.
    pub async fn detect_all(
        &self,
        spacing_collection: Option<&str>,
        radius_collection: Option<&str>,
    ) -> Result<(DetectionReport, DetectionReport)> {
        let (spacing, radius) = futures::join!(
            self.detect(Category::Spacing, spacing_collection),
            self.detect(Category::BorderRadius, radius_collection),
        );
        Ok((spacing?, radius?))
    }
}
