//! In-memory host backend.
//!
//! This is the reference implementation of `HostBackend`.
//! It holds a whole document (variables, libraries, scene graph, markers)
//! in simple collections protected by RwLock, and can be loaded from or
//! saved to a JSON `Document` snapshot.
//!
//! ## Limitations
//!
//! - **One page**: `page_children()` is the document's root list; markers
//!   live beside the scene nodes rather than inside the tree.
//! - **No alias resolution**: binding to a variable whose first mode is not
//!   a plain float fails.
//!
//! Use this backend for:
//! - Testing the token pipeline, detector and binder without a design tool
//! - The `tokenlint` CLI, which lints a document snapshot on disk
//! - Fault injection (failed imports, rejected or dropped bindings)

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::{Error, Result};
use super::{HostBackend, HostCapabilities, MarkerRecord, MarkerSpec};

// ============================================================================
// Document snapshot
// ============================================================================

/// A library as the host would expose it: one collection plus the
/// variables that can be imported from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    pub collection: LibraryCollection,
    #[serde(default)]
    pub variables: Vec<TokenRecord>,
}

/// A marker stored on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMarker {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub marker_for: Option<NodeId>,
    #[serde(default)]
    pub spec: Option<MarkerSpec>,
}

/// Serializable snapshot of everything `MemoryHost` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub capabilities: HostCapabilities,
    pub collections: Vec<CollectionDescriptor>,
    pub variables: Vec<TokenRecord>,
    pub libraries: Vec<LibrarySnapshot>,
    pub nodes: Vec<SceneNode>,
    /// Top-level nodes of the page, in z-order.
    pub page: Vec<NodeId>,
    pub selection: Vec<NodeId>,
    pub markers: Vec<StoredMarker>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            capabilities: HostCapabilities::full(),
            collections: Vec::new(),
            variables: Vec::new(),
            libraries: Vec::new(),
            nodes: Vec::new(),
            page: Vec::new(),
            selection: Vec::new(),
            markers: Vec::new(),
        }
    }
}

// ============================================================================
// Fault injection + call counters
// ============================================================================

#[derive(Default)]
struct Faults {
    failing_imports: HashSet<String>,
    failing_library_collections: HashSet<String>,
    fail_library_listing: bool,
    fail_local_variables: bool,
    rejected_bindings: HashSet<(NodeId, NodeField)>,
    dropped_bindings: HashSet<(NodeId, NodeField)>,
}

/// How often the expensive host APIs were called.
#[derive(Debug, Default)]
pub struct CallStats {
    local_variable_reads: AtomicUsize,
    library_collection_reads: AtomicUsize,
    imports: AtomicUsize,
    bindings: AtomicUsize,
}

impl CallStats {
    pub fn local_variable_reads(&self) -> usize {
        self.local_variable_reads.load(Ordering::Relaxed)
    }

    pub fn library_collection_reads(&self) -> usize {
        self.library_collection_reads.load(Ordering::Relaxed)
    }

    pub fn imports(&self) -> usize {
        self.imports.load(Ordering::Relaxed)
    }

    pub fn bindings(&self) -> usize {
        self.bindings.load(Ordering::Relaxed)
    }
}

// ============================================================================
// MemoryHost
// ============================================================================

/// In-memory design document. Clones share the same document.
#[derive(Clone)]
pub struct MemoryHost {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    capabilities: RwLock<HostCapabilities>,
    collections: RwLock<Vec<CollectionDescriptor>>,
    variables: RwLock<Vec<TokenRecord>>,
    libraries: RwLock<Vec<LibrarySnapshot>>,
    /// Library variables imported so far, by id.
    imported: RwLock<HashMap<VariableId, TokenRecord>>,
    nodes: RwLock<HashMap<NodeId, SceneNode>>,
    page: RwLock<Vec<NodeId>>,
    selection: RwLock<Vec<NodeId>>,
    markers: RwLock<Vec<StoredMarker>>,
    notifications: RwLock<Vec<String>>,
    faults: RwLock<Faults>,
    stats: CallStats,
    next_marker_id: AtomicU64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Empty document with every capability available.
    pub fn new() -> Self {
        Self::from_document(Document::default())
    }

    pub fn from_document(doc: Document) -> Self {
        let next_marker_id = doc
            .markers
            .iter()
            .filter_map(|m| m.id.as_str().strip_prefix("marker:")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            inner: Arc::new(MemoryInner {
                capabilities: RwLock::new(doc.capabilities),
                collections: RwLock::new(doc.collections),
                variables: RwLock::new(doc.variables),
                libraries: RwLock::new(doc.libraries),
                imported: RwLock::new(HashMap::new()),
                nodes: RwLock::new(doc.nodes.into_iter().map(|n| (n.id.clone(), n)).collect()),
                page: RwLock::new(doc.page),
                selection: RwLock::new(doc.selection),
                markers: RwLock::new(doc.markers),
                notifications: RwLock::new(Vec::new()),
                faults: RwLock::new(Faults::default()),
                stats: CallStats::default(),
                next_marker_id: AtomicU64::new(next_marker_id),
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(json)?;
        Ok(Self::from_document(doc))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write the current state as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Current state as a serializable document. Nodes are sorted by id.
    pub fn snapshot(&self) -> Document {
        let mut nodes: Vec<SceneNode> = self.inner.nodes.read().values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Document {
            capabilities: *self.inner.capabilities.read(),
            collections: self.inner.collections.read().clone(),
            variables: self.inner.variables.read().clone(),
            libraries: self.inner.libraries.read().clone(),
            nodes,
            page: self.inner.page.read().clone(),
            selection: self.inner.selection.read().clone(),
            markers: self.inner.markers.read().clone(),
        }
    }

    // ========================================================================
    // Document building
    // ========================================================================

    pub fn set_capabilities(&self, caps: HostCapabilities) {
        *self.inner.capabilities.write() = caps;
    }

    pub fn add_collection(&self, collection: CollectionDescriptor) {
        self.inner.collections.write().push(collection);
    }

    pub fn add_variable(&self, record: TokenRecord) {
        self.inner.variables.write().push(record);
    }

    pub fn add_library(&self, library: LibrarySnapshot) {
        self.inner.libraries.write().push(library);
    }

    /// Insert a node without attaching it to the page (e.g. a child).
    pub fn add_node(&self, node: SceneNode) {
        self.inner.nodes.write().insert(node.id.clone(), node);
    }

    /// Insert a node as a top-level page child.
    pub fn add_page_node(&self, node: SceneNode) {
        self.inner.page.write().push(node.id.clone());
        self.add_node(node);
    }

    pub fn set_selection(&self, ids: impl IntoIterator<Item = impl Into<String>>) {
        *self.inner.selection.write() = ids.into_iter().map(|s| NodeId(s.into())).collect();
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn node(&self, id: &str) -> Option<SceneNode> {
        self.inner.nodes.read().get(&NodeId::from(id)).cloned()
    }

    pub fn markers(&self) -> Vec<StoredMarker> {
        self.inner.markers.read().clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.inner.notifications.read().clone()
    }

    pub fn stats(&self) -> &CallStats {
        &self.inner.stats
    }

    // ========================================================================
    // Fault injection
    // ========================================================================

    /// Make `import_variable(key)` fail.
    pub fn fail_import(&self, key: &str) {
        self.inner.faults.write().failing_imports.insert(key.to_string());
    }

    /// Make `local_variables()` fail (or succeed again).
    pub fn fail_local_variables(&self, fail: bool) {
        self.inner.faults.write().fail_local_variables = fail;
    }

    /// Make `library_collections()` fail.
    pub fn fail_library_listing(&self) {
        self.inner.faults.write().fail_library_listing = true;
    }

    /// Make `library_variables(collection_key)` fail.
    pub fn fail_library_collection(&self, collection_key: &str) {
        self.inner
            .faults
            .write()
            .failing_library_collections
            .insert(collection_key.to_string());
    }

    /// Make binding `field` on `node` return an error.
    pub fn reject_binding(&self, node: &str, field: NodeField) {
        self.inner.faults.write().rejected_bindings.insert((NodeId::from(node), field));
    }

    /// Make binding `field` on `node` report success without taking effect.
    pub fn drop_binding(&self, node: &str, field: NodeField) {
        self.inner.faults.write().dropped_bindings.insert((NodeId::from(node), field));
    }

    fn resolve_variable(&self, id: &VariableId) -> Option<TokenRecord> {
        if let Some(rec) = self.inner.variables.read().iter().find(|v| &v.id == id) {
            return Some(rec.clone());
        }
        self.inner.imported.read().get(id).cloned()
    }

    fn require(&self, present: bool, api: &str) -> Result<()> {
        if present {
            Ok(())
        } else {
            Err(Error::Capability(api.to_string()))
        }
    }
}

// ============================================================================
// HostBackend impl
// ============================================================================

#[async_trait]
impl HostBackend for MemoryHost {
    fn capabilities(&self) -> HostCapabilities {
        *self.inner.capabilities.read()
    }

    // ========================================================================
    // Variables
    // ========================================================================

    async fn local_variables(&self) -> Result<Vec<TokenRecord>> {
        self.require(self.capabilities().local_variables, "local variables")?;
        self.inner.stats.local_variable_reads.fetch_add(1, Ordering::Relaxed);
        if self.inner.faults.read().fail_local_variables {
            return Err(Error::Host("local variable store unavailable".into()));
        }
        Ok(self.inner.variables.read().clone())
    }

    async fn local_collections(&self) -> Result<Vec<CollectionDescriptor>> {
        self.require(self.capabilities().local_collections, "local collections")?;
        Ok(self.inner.collections.read().clone())
    }

    async fn library_collections(&self) -> Result<Vec<LibraryCollection>> {
        self.require(self.capabilities().library_collections, "library collections")?;
        self.inner.stats.library_collection_reads.fetch_add(1, Ordering::Relaxed);
        if self.inner.faults.read().fail_library_listing {
            return Err(Error::Host("library listing unavailable".into()));
        }
        Ok(self.inner.libraries.read().iter().map(|l| l.collection.clone()).collect())
    }

    async fn library_variables(&self, collection_key: &str) -> Result<Vec<LibraryVariableStub>> {
        self.require(self.capabilities().library_variables, "library variables")?;
        if self.inner.faults.read().failing_library_collections.contains(collection_key) {
            return Err(Error::Host(format!("cannot list library collection {collection_key}")));
        }
        let libraries = self.inner.libraries.read();
        let library = libraries
            .iter()
            .find(|l| l.collection.key == collection_key)
            .ok_or_else(|| Error::NotFound(format!("Library collection {collection_key}")))?;
        Ok(library
            .variables
            .iter()
            .map(|v| LibraryVariableStub {
                key: v.key.clone(),
                name: v.name.clone(),
                resolved_type: v.resolved_type,
            })
            .collect())
    }

    async fn import_variable(&self, key: &str) -> Result<TokenRecord> {
        self.require(self.capabilities().import_by_key, "import by key")?;
        self.inner.stats.imports.fetch_add(1, Ordering::Relaxed);
        if self.inner.faults.read().failing_imports.contains(key) {
            return Err(Error::Host(format!("import of {key} failed")));
        }
        let record = self
            .inner
            .libraries
            .read()
            .iter()
            .flat_map(|l| l.variables.iter())
            .find(|v| v.key == key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Library variable {key}")))?;
        self.inner.imported.write().insert(record.id.clone(), record.clone());
        Ok(record)
    }

    // ========================================================================
    // Scene graph
    // ========================================================================

    async fn selection(&self) -> Result<Vec<NodeId>> {
        Ok(self.inner.selection.read().clone())
    }

    async fn page_children(&self) -> Result<Vec<NodeId>> {
        Ok(self.inner.page.read().clone())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<SceneNode>> {
        Ok(self.inner.nodes.read().get(id).cloned())
    }

    async fn set_bound_variable(
        &self,
        id: &NodeId,
        field: NodeField,
        variable: Option<&VariableId>,
    ) -> Result<()> {
        let Some(var_id) = variable else {
            let mut nodes = self.inner.nodes.write();
            let node = nodes.get_mut(id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
            node.bound_variables.remove(&field);
            return Ok(());
        };

        self.inner.stats.bindings.fetch_add(1, Ordering::Relaxed);
        {
            let faults = self.inner.faults.read();
            let target = (id.clone(), field);
            if faults.rejected_bindings.contains(&target) {
                return Err(Error::Host(format!("cannot bind {field} on node {id}")));
            }
            if faults.dropped_bindings.contains(&target) {
                return Ok(());
            }
        }

        let record = self
            .resolve_variable(var_id)
            .ok_or_else(|| Error::NotFound(format!("Variable {var_id}")))?;
        let value = record
            .first_mode_value()
            .and_then(VariableValue::as_float)
            .ok_or_else(|| Error::Binding(format!("variable {var_id} is not a float")))?;

        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        if node.field_value(field).is_none() {
            return Err(Error::Binding(format!("{} has no {field}", node_kind_name(id, &node.kind))));
        }
        if let Some(slot) = node.field_mut(field) {
            *slot = value;
        }
        node.bound_variables.insert(field, var_id.clone());
        Ok(())
    }

    async fn set_field_value(&self, id: &NodeId, field: NodeField, value: f64) -> Result<()> {
        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        let kind = node_kind_name(id, &node.kind);
        let slot = node
            .field_mut(field)
            .ok_or_else(|| Error::Host(format!("{kind} has no {field}")))?;
        *slot = value;
        Ok(())
    }

    // ========================================================================
    // Markers
    // ========================================================================

    async fn create_marker(&self, spec: MarkerSpec) -> Result<NodeId> {
        let id = NodeId(format!(
            "marker:{}",
            self.inner.next_marker_id.fetch_add(1, Ordering::Relaxed)
        ));
        self.inner.markers.write().push(StoredMarker {
            id: id.clone(),
            name: spec.kind.node_name().to_string(),
            marker_for: Some(spec.marker_for.clone()),
            spec: Some(spec),
        });
        Ok(id)
    }

    async fn page_markers(&self) -> Result<Vec<MarkerRecord>> {
        Ok(self
            .inner
            .markers
            .read()
            .iter()
            .map(|m| MarkerRecord {
                id: m.id.clone(),
                name: m.name.clone(),
                marker_for: m.marker_for.clone(),
            })
            .collect())
    }

    async fn remove_marker(&self, id: &NodeId) -> Result<bool> {
        let mut markers = self.inner.markers.write();
        let before = markers.len();
        markers.retain(|m| &m.id != id);
        Ok(markers.len() != before)
    }

    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!(%message, "host notification");
        self.inner.notifications.write().push(message.to_string());
        Ok(())
    }
}

fn node_kind_name(id: &NodeId, kind: &NodeKind) -> String {
    format!("{} node {id}", kind.type_name())
}
