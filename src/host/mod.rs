//! # Host Backend Trait
//!
//! This is THE contract between the linter and the design tool that owns
//! the document. Variables, libraries, the scene graph, bindings and
//! markers are all reached through it.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryHost` | `memory` | In-memory document for testing/embedding and the CLI |

pub mod memory;
pub mod walk;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::Result;

pub use memory::{Document, LibrarySnapshot, MemoryHost};
pub use walk::ScopeWalk;

// ============================================================================
// Host capabilities
// ============================================================================

/// Which optional host APIs exist. Probed once when a session starts.
///
/// All fields default to false. Hosts override via `capabilities()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostCapabilities {
    pub local_variables: bool,
    pub local_collections: bool,
    pub library_collections: bool,
    pub library_variables: bool,
    pub import_by_key: bool,
}

impl HostCapabilities {
    /// Everything available.
    pub fn full() -> Self {
        Self {
            local_variables: true,
            local_collections: true,
            library_collections: true,
            library_variables: true,
            import_by_key: true,
        }
    }

    /// Baseline read + import. Without it no tokens can be produced at all.
    pub fn has_variables_api(&self) -> bool {
        self.local_variables && self.import_by_key
    }

    /// Library listing and import are all present.
    pub fn has_library_api(&self) -> bool {
        self.library_collections && self.library_variables && self.import_by_key
    }
}

// ============================================================================
// Marker contract
// ============================================================================

/// Recognized marker kinds. The name is what identifies a marker on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    SpacingIssue,
    RadiusIssue,
}

impl MarkerKind {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Spacing => MarkerKind::SpacingIssue,
            Category::BorderRadius => MarkerKind::RadiusIssue,
        }
    }

    pub fn node_name(&self) -> &'static str {
        match self {
            MarkerKind::SpacingIssue => "spacing-issue-marker",
            MarkerKind::RadiusIssue => "radius-issue-marker",
        }
    }

    pub fn from_node_name(name: &str) -> Option<Self> {
        match name {
            "spacing-issue-marker" => Some(MarkerKind::SpacingIssue),
            "radius-issue-marker" => Some(MarkerKind::RadiusIssue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    Circle,
    Square,
}

/// Everything needed to draw one marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSpec {
    pub kind: MarkerKind,
    /// Persisted as the marker's `markerFor` tag.
    pub marker_for: NodeId,
    pub fixable: bool,
    pub shape: MarkerShape,
    pub color: Rgba,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// A marker as found on the page. `kind` is `None` for unrecognized names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub id: NodeId,
    pub name: String,
    pub marker_for: Option<NodeId>,
}

impl MarkerRecord {
    pub fn kind(&self) -> Option<MarkerKind> {
        MarkerKind::from_node_name(&self.name)
    }
}

// ============================================================================
// HostBackend Trait
// ============================================================================

/// The host contract.
///
/// Calls are asynchronous and may interleave with user edits, so every
/// `get_node` returns a fresh snapshot. Hosts return `Error::Capability`
/// for APIs they lack rather than panicking.
#[async_trait]
pub trait HostBackend: Send + Sync + 'static {
    /// Report which optional APIs exist.
    fn capabilities(&self) -> HostCapabilities;

    // ========================================================================
    // Variables
    // ========================================================================

    /// All variables defined in the document itself.
    async fn local_variables(&self) -> Result<Vec<TokenRecord>>;

    /// Collections defined in the document itself.
    async fn local_collections(&self) -> Result<Vec<CollectionDescriptor>>;

    /// Variable collections published by enabled libraries.
    async fn library_collections(&self) -> Result<Vec<LibraryCollection>>;

    /// Unresolved variables of one library collection.
    async fn library_variables(&self, collection_key: &str) -> Result<Vec<LibraryVariableStub>>;

    /// Import (resolve) a library variable by natural key.
    async fn import_variable(&self, key: &str) -> Result<TokenRecord>;

    // ========================================================================
    // Scene graph
    // ========================================================================

    /// Currently selected nodes (possibly empty).
    async fn selection(&self) -> Result<Vec<NodeId>>;

    /// Top-level nodes of the active page.
    async fn page_children(&self) -> Result<Vec<NodeId>>;

    /// Snapshot of a node. `None` if it no longer exists.
    async fn get_node(&self, id: &NodeId) -> Result<Option<SceneNode>>;

    /// Bind `field` to a variable, or clear the binding with `None`.
    ///
    /// Binding makes the host recompute the field from the variable; clearing
    /// leaves the last computed value in place.
    async fn set_bound_variable(
        &self,
        id: &NodeId,
        field: NodeField,
        variable: Option<&VariableId>,
    ) -> Result<()>;

    /// Write a static value.
    async fn set_field_value(&self, id: &NodeId, field: NodeField, value: f64) -> Result<()>;

    // ========================================================================
    // Markers
    // ========================================================================

    /// Draw a marker on the active page and return its id.
    async fn create_marker(&self, spec: MarkerSpec) -> Result<NodeId>;

    /// All markers on the active page.
    async fn page_markers(&self) -> Result<Vec<MarkerRecord>>;

    /// Remove a marker. Returns true if it existed.
    async fn remove_marker(&self, id: &NodeId) -> Result<bool>;

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Show a transient host-level notification.
    ///
    /// Default: log only.
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!(%message, "host notification");
        Ok(())
    }
}
