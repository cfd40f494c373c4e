//! End-to-end tests for binding issues to tokens and reverting bindings.
//!
//! Each test runs detect -> fix (-> revert) against `MemoryHost`, reading the
//! node back from the host after every step.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokenlint::bind::{bind_issue, fix_issues, revert_field, revert_scope};
use tokenlint::host::{MarkerRecord, MarkerSpec};
use tokenlint::model::{AutoLayout, CornerRadii, LayoutMode, LibraryCollection, LibraryVariableStub};
use tokenlint::{
    BatchPool, Category, CollectionDescriptor, Error, HostBackend, HostCapabilities, IssueDetector,
    IssueProperty, MemoryHost, NodeField, NodeId, NodeKind, Result, SceneNode, TokenAggregator,
    TokenCache, TokenRecord, VariableId,
};

fn cache_for(host: &MemoryHost) -> TokenCache {
    let aggregator = TokenAggregator::new(host.capabilities(), BatchPool::new(5, Duration::ZERO));
    TokenCache::new(aggregator, Duration::from_secs(300))
}

fn row(id: &str, item_spacing: f64) -> SceneNode {
    SceneNode::new(
        id,
        NodeKind::frame(AutoLayout {
            layout_mode: LayoutMode::Horizontal,
            item_spacing,
            ..Default::default()
        }),
    )
}

fn padded(id: &str, padding: f64) -> SceneNode {
    SceneNode::new(
        id,
        NodeKind::frame(AutoLayout {
            layout_mode: LayoutMode::Vertical,
            padding_left: padding,
            padding_right: padding,
            padding_top: padding,
            padding_bottom: padding,
            ..Default::default()
        }),
    )
}

fn host_with_tokens() -> MemoryHost {
    let host = MemoryHost::new();
    host.add_variable(TokenRecord::float("v:s8", "s8", "space-sm", "c:core", 8.0));
    host.add_variable(TokenRecord::float("v:s16", "s16", "space-md", "c:core", 16.0));
    host.add_variable(TokenRecord::float("v:r4", "r4", "radius-sm", "c:core", 4.0));
    host
}

// ============================================================================
// 1. Matching gap: detect, fix, re-detect, revert
// ============================================================================

#[tokio::test]
async fn test_gap_fix_and_revert_round_trip() {
    let host = host_with_tokens();
    host.add_page_node(row("row", 16.0));
    let cache = cache_for(&host);
    let detector = IssueDetector::new(&host, &cache);

    let report = detector.detect(Category::Spacing, None).await.unwrap();
    assert_eq!(report.count(), 1);
    assert_eq!(report.issues[0].property, IssueProperty::ItemSpacing);
    assert_eq!(report.issues[0].matching_token.as_ref().unwrap().name, "space-md");

    let fixed = fix_issues(&host, &report.issues).await;
    assert_eq!((fixed.fixed, fixed.unfixable), (1, 0));

    let node = host.node("row").unwrap();
    assert_eq!(node.bound_variable(NodeField::ItemSpacing), Some(&VariableId::from("v:s16")));
    assert_eq!(detector.detect(Category::Spacing, None).await.unwrap().count(), 0);

    let reverted = revert_scope(&host, &[Category::Spacing]).await.unwrap();
    assert_eq!(reverted.spacing, 1);

    let node = host.node("row").unwrap();
    assert!(!node.is_bound(NodeField::ItemSpacing));
    assert_eq!(node.field_value(NodeField::ItemSpacing), Some(16.0));
}

// ============================================================================
// 2. Unmatched gap stays untouched
// ============================================================================

#[tokio::test]
async fn test_unmatched_gap_is_left_alone() {
    let host = host_with_tokens();
    host.add_page_node(row("row", 15.0));
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();
    assert_eq!(report.issues[0].message, "No exact token for 15px gap");

    let fixed = fix_issues(&host, &report.issues).await;
    assert_eq!((fixed.fixed, fixed.unfixable), (0, 1));

    let node = host.node("row").unwrap();
    assert!(!node.is_bound(NodeField::ItemSpacing));
    assert_eq!(node.field_value(NodeField::ItemSpacing), Some(15.0));
    assert_eq!(host.stats().bindings(), 0);
}

// ============================================================================
// 3. Uniform radius binds all four corners
// ============================================================================

#[tokio::test]
async fn test_uniform_radius_binds_every_corner() {
    let host = host_with_tokens();
    host.add_page_node(SceneNode::new("chip", NodeKind::Rectangle { corners: CornerRadii::uniform(4.0) }));
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::BorderRadius, None)
        .await
        .unwrap();
    assert_eq!(report.count(), 1);
    assert_eq!(report.issues[0].property, IssueProperty::BorderRadiusAll);
    assert!(report.issues[0].is_fixable());

    let fixed = fix_issues(&host, &report.issues).await;
    assert_eq!(fixed.fixed, 1);

    let node = host.node("chip").unwrap();
    for field in NodeField::RADIUS {
        assert_eq!(node.bound_variable(field), Some(&VariableId::from("v:r4")), "{field}");
    }
}

// ============================================================================
// 4. Binding failures surface as unfixable
// ============================================================================

#[tokio::test]
async fn test_composite_failure_restores_bound_edges() {
    let host = host_with_tokens();
    host.add_page_node(padded("card", 8.0));
    host.reject_binding("card", NodeField::PaddingBottom);
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();
    assert_eq!(report.issues[0].property, IssueProperty::PaddingAll);

    let fixed = fix_issues(&host, &report.issues).await;
    assert_eq!((fixed.fixed, fixed.unfixable), (0, 1));

    let node = host.node("card").unwrap();
    for field in [
        NodeField::PaddingLeft,
        NodeField::PaddingRight,
        NodeField::PaddingTop,
        NodeField::PaddingBottom,
    ] {
        assert!(!node.is_bound(field), "{field} left bound");
        assert_eq!(node.field_value(field), Some(8.0));
    }
}

#[tokio::test]
async fn test_binding_that_does_not_stick_is_unfixable() {
    let host = host_with_tokens();
    host.add_page_node(row("row", 8.0));
    host.drop_binding("row", NodeField::ItemSpacing);
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();
    let fixed = fix_issues(&host, &report.issues).await;

    assert_eq!((fixed.fixed, fixed.unfixable), (0, 1));
    assert!(!host.node("row").unwrap().is_bound(NodeField::ItemSpacing));
}

#[tokio::test]
async fn test_mixed_fix_counts() {
    let host = host_with_tokens();
    host.add_page_node(row("a", 16.0));
    host.add_page_node(row("b", 13.0));
    host.add_page_node(row("c", 8.0));
    host.reject_binding("c", NodeField::ItemSpacing);
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();
    let fixed = fix_issues(&host, &report.issues).await;

    assert_eq!((fixed.fixed, fixed.unfixable), (1, 2));
}

/// Delegates to `MemoryHost`, but the `fail_at`-th node read errors.
struct FailingRead {
    inner: MemoryHost,
    reads: AtomicUsize,
    fail_at: usize,
}

impl FailingRead {
    fn new(inner: MemoryHost, fail_at: usize) -> Self {
        Self { inner, reads: AtomicUsize::new(0), fail_at }
    }
}

#[async_trait]
impl HostBackend for FailingRead {
    fn capabilities(&self) -> HostCapabilities {
        self.inner.capabilities()
    }
    async fn local_variables(&self) -> Result<Vec<TokenRecord>> {
        self.inner.local_variables().await
    }
    async fn local_collections(&self) -> Result<Vec<CollectionDescriptor>> {
        self.inner.local_collections().await
    }
    async fn library_collections(&self) -> Result<Vec<LibraryCollection>> {
        self.inner.library_collections().await
    }
    async fn library_variables(&self, collection_key: &str) -> Result<Vec<LibraryVariableStub>> {
        self.inner.library_variables(collection_key).await
    }
    async fn import_variable(&self, key: &str) -> Result<TokenRecord> {
        self.inner.import_variable(key).await
    }
    async fn selection(&self) -> Result<Vec<NodeId>> {
        self.inner.selection().await
    }
    async fn page_children(&self) -> Result<Vec<NodeId>> {
        self.inner.page_children().await
    }
    async fn get_node(&self, id: &NodeId) -> Result<Option<SceneNode>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at {
            return Err(Error::Host(format!("read of {id} timed out")));
        }
        self.inner.get_node(id).await
    }
    async fn set_bound_variable(&self, id: &NodeId, field: NodeField, variable: Option<&VariableId>) -> Result<()> {
        self.inner.set_bound_variable(id, field, variable).await
    }
    async fn set_field_value(&self, id: &NodeId, field: NodeField, value: f64) -> Result<()> {
        self.inner.set_field_value(id, field, value).await
    }
    async fn create_marker(&self, spec: MarkerSpec) -> Result<NodeId> {
        self.inner.create_marker(spec).await
    }
    async fn page_markers(&self) -> Result<Vec<MarkerRecord>> {
        self.inner.page_markers().await
    }
    async fn remove_marker(&self, id: &NodeId) -> Result<bool> {
        self.inner.remove_marker(id).await
    }
}

#[tokio::test]
async fn test_composite_unverified_member_is_restored() {
    let host = host_with_tokens();
    let mut card = padded("card", 0.0);
    if let Some(layout) = card.kind.layout_mut() {
        layout.padding_left = 8.0;
        layout.padding_right = 8.0;
    }
    host.add_page_node(card);
    let cache = cache_for(&host);

    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();
    assert_eq!(report.issues[0].property, IssueProperty::HorizontalPadding);

    // Reads: prior state, check left, check right (fails after the write landed).
    let flaky = FailingRead::new(host.clone(), 3);
    assert!(!bind_issue(&flaky, &report.issues[0]).await);

    let node = host.node("card").unwrap();
    assert!(!node.is_bound(NodeField::PaddingLeft));
    assert!(!node.is_bound(NodeField::PaddingRight));
    assert_eq!(node.field_value(NodeField::PaddingRight), Some(8.0));
}

#[tokio::test]
async fn test_composite_failed_prior_read_binds_nothing() {
    let host = host_with_tokens();
    host.add_page_node(padded("card", 8.0));
    let cache = cache_for(&host);
    let report = IssueDetector::new(&host, &cache)
        .detect(Category::Spacing, None)
        .await
        .unwrap();

    let flaky = FailingRead::new(host.clone(), 1);
    let fixed = fix_issues(&flaky, &report.issues).await;

    assert_eq!((fixed.fixed, fixed.unfixable), (0, 1));
    assert!(host.node("card").unwrap().bound_variables.is_empty());
    assert_eq!(host.stats().bindings(), 0);
}

// ============================================================================
// 5. Revert
// ============================================================================

#[tokio::test]
async fn test_revert_unbound_field_is_noop() {
    let host = host_with_tokens();
    host.add_page_node(row("row", 12.0));

    let reverted = revert_field(&host, &NodeId::from("row"), NodeField::ItemSpacing).await.unwrap();

    assert!(!reverted);
    assert_eq!(host.node("row").unwrap().field_value(NodeField::ItemSpacing), Some(12.0));
}

#[tokio::test]
async fn test_revert_twice_second_is_noop() {
    let host = host_with_tokens();
    host.add_page_node(row("row", 16.0));
    let id = NodeId::from("row");
    host.set_bound_variable(&id, NodeField::ItemSpacing, Some(&VariableId::from("v:s16")))
        .await
        .unwrap();

    assert!(revert_field(&host, &id, NodeField::ItemSpacing).await.unwrap());
    assert!(!revert_field(&host, &id, NodeField::ItemSpacing).await.unwrap());
    assert_eq!(host.node("row").unwrap().field_value(NodeField::ItemSpacing), Some(16.0));
}

#[tokio::test]
async fn test_revert_is_unconditional_and_per_category() {
    let host = host_with_tokens();
    // Bound from the start, never flagged as an issue.
    host.add_page_node(
        SceneNode::new(
            "card",
            NodeKind::Frame {
                layout: AutoLayout {
                    layout_mode: LayoutMode::Vertical,
                    padding_left: 8.0,
                    padding_top: 16.0,
                    ..Default::default()
                },
                corners: CornerRadii::uniform(4.0),
            },
        )
        .with_binding(NodeField::PaddingLeft, "v:s8")
        .with_binding(NodeField::PaddingTop, "v:s16")
        .with_binding(NodeField::TopLeftRadius, "v:r4")
        .with_binding(NodeField::BottomRightRadius, "v:r4"),
    );

    let spacing_only = revert_scope(&host, &[Category::Spacing]).await.unwrap();
    assert_eq!((spacing_only.spacing, spacing_only.border_radius), (2, 0));
    let node = host.node("card").unwrap();
    assert!(node.is_bound(NodeField::TopLeftRadius));
    assert_eq!(node.field_value(NodeField::PaddingTop), Some(16.0));

    let all = revert_scope(&host, &[Category::Spacing, Category::BorderRadius]).await.unwrap();
    assert_eq!((all.spacing, all.border_radius, all.total()), (0, 2, 2));
    let node = host.node("card").unwrap();
    assert!(node.bound_variables.is_empty());
    assert_eq!(node.field_value(NodeField::BottomRightRadius), Some(4.0));
}
