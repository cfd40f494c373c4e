//! Visual nodes of the host scene graph, as seen by the linter.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::VariableId;

/// Opaque host node identifier (e.g. `"12:34"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single bindable numeric property of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeField {
    ItemSpacing,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    TopLeftRadius,
    TopRightRadius,
    BottomLeftRadius,
    BottomRightRadius,
}

impl NodeField {
    pub const SPACING: [NodeField; 5] = [
        NodeField::ItemSpacing,
        NodeField::PaddingLeft,
        NodeField::PaddingRight,
        NodeField::PaddingTop,
        NodeField::PaddingBottom,
    ];

    pub const RADIUS: [NodeField; 4] = [
        NodeField::TopLeftRadius,
        NodeField::TopRightRadius,
        NodeField::BottomLeftRadius,
        NodeField::BottomRightRadius,
    ];

    /// Host property name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeField::ItemSpacing => "itemSpacing",
            NodeField::PaddingLeft => "paddingLeft",
            NodeField::PaddingRight => "paddingRight",
            NodeField::PaddingTop => "paddingTop",
            NodeField::PaddingBottom => "paddingBottom",
            NodeField::TopLeftRadius => "topLeftRadius",
            NodeField::TopRightRadius => "topRightRadius",
            NodeField::BottomLeftRadius => "bottomLeftRadius",
            NodeField::BottomRightRadius => "bottomRightRadius",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn from_host_name(name: &str) -> Option<Self> {
        Self::SPACING.into_iter().chain(Self::RADIUS).find(|f| f.as_str() == name)
    }

    pub fn is_radius(&self) -> bool {
        Self::RADIUS.contains(self)
    }
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auto-layout direction. `None` means the frame does not lay out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Layout properties of a container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoLayout {
    pub layout_mode: LayoutMode,
    pub item_spacing: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl AutoLayout {
    pub fn is_enabled(&self) -> bool {
        self.layout_mode != LayoutMode::None
    }
}

/// Per-corner radii.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CornerRadii {
    pub top_left_radius: f64,
    pub top_right_radius: f64,
    pub bottom_left_radius: f64,
    pub bottom_right_radius: f64,
}

impl CornerRadii {
    pub fn uniform(r: f64) -> Self {
        Self {
            top_left_radius: r,
            top_right_radius: r,
            bottom_left_radius: r,
            bottom_right_radius: r,
        }
    }
}

/// Node type with the property sets that type carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Frame {
        #[serde(default)]
        layout: AutoLayout,
        #[serde(default)]
        corners: CornerRadii,
    },
    Component {
        #[serde(default)]
        layout: AutoLayout,
        #[serde(default)]
        corners: CornerRadii,
    },
    Instance {
        #[serde(default)]
        layout: AutoLayout,
        #[serde(default)]
        corners: CornerRadii,
    },
    Rectangle {
        #[serde(default)]
        corners: CornerRadii,
    },
    Group,
    Text,
    Vector,
    Ellipse,
    #[serde(other)]
    Other,
}

impl NodeKind {
    pub fn frame(layout: AutoLayout) -> Self {
        NodeKind::Frame { layout, corners: CornerRadii::default() }
    }

    pub fn layout(&self) -> Option<&AutoLayout> {
        match self {
            NodeKind::Frame { layout, .. }
            | NodeKind::Component { layout, .. }
            | NodeKind::Instance { layout, .. } => Some(layout),
            _ => None,
        }
    }

    pub fn layout_mut(&mut self) -> Option<&mut AutoLayout> {
        match self {
            NodeKind::Frame { layout, .. }
            | NodeKind::Component { layout, .. }
            | NodeKind::Instance { layout, .. } => Some(layout),
            _ => None,
        }
    }

    pub fn corners(&self) -> Option<&CornerRadii> {
        match self {
            NodeKind::Frame { corners, .. }
            | NodeKind::Component { corners, .. }
            | NodeKind::Instance { corners, .. }
            | NodeKind::Rectangle { corners } => Some(corners),
            _ => None,
        }
    }

    pub fn corners_mut(&mut self) -> Option<&mut CornerRadii> {
        match self {
            NodeKind::Frame { corners, .. }
            | NodeKind::Component { corners, .. }
            | NodeKind::Instance { corners, .. }
            | NodeKind::Rectangle { corners } => Some(corners),
            _ => None,
        }
    }

    pub fn supports_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Frame { .. }
                | NodeKind::Component { .. }
                | NodeKind::Instance { .. }
                | NodeKind::Group
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Frame { .. } => "FRAME",
            NodeKind::Component { .. } => "COMPONENT",
            NodeKind::Instance { .. } => "INSTANCE",
            NodeKind::Rectangle { .. } => "RECTANGLE",
            NodeKind::Group => "GROUP",
            NodeKind::Text => "TEXT",
            NodeKind::Vector => "VECTOR",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Other => "OTHER",
        }
    }
}

/// A point-in-time snapshot of a host node.
///
/// Snapshots go stale as soon as the host is awaited again; callers re-read
/// through `HostBackend::get_node` rather than holding one across a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Absolute position of the node's top-left corner.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Only the fields this crate binds; other host bindings (fills, width,
    /// ...) are dropped on load.
    #[serde(default, deserialize_with = "known_bindings")]
    pub bound_variables: HashMap<NodeField, VariableId>,
}

fn known_bindings<'de, D>(deserializer: D) -> Result<HashMap<NodeField, VariableId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let field = NodeField::from_host_name(&key)?;
            match value {
                serde_json::Value::String(id) => Some((field, VariableId(id))),
                _ => None,
            }
        })
        .collect())
}

impl SceneNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(id.into()),
            name: String::new(),
            kind,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            bound_variables: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.children = children.into_iter().map(|c| NodeId(c.into())).collect();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_binding(mut self, field: NodeField, variable: impl Into<String>) -> Self {
        self.bound_variables.insert(field, VariableId(variable.into()));
        self
    }

    /// Current (computed) value of a field, `None` if this node type lacks it.
    pub fn field_value(&self, field: NodeField) -> Option<f64> {
        match field {
            NodeField::ItemSpacing => self.kind.layout().map(|l| l.item_spacing),
            NodeField::PaddingLeft => self.kind.layout().map(|l| l.padding_left),
            NodeField::PaddingRight => self.kind.layout().map(|l| l.padding_right),
            NodeField::PaddingTop => self.kind.layout().map(|l| l.padding_top),
            NodeField::PaddingBottom => self.kind.layout().map(|l| l.padding_bottom),
            NodeField::TopLeftRadius => self.kind.corners().map(|c| c.top_left_radius),
            NodeField::TopRightRadius => self.kind.corners().map(|c| c.top_right_radius),
            NodeField::BottomLeftRadius => self.kind.corners().map(|c| c.bottom_left_radius),
            NodeField::BottomRightRadius => self.kind.corners().map(|c| c.bottom_right_radius),
        }
    }

    /// Writable slot for a field, `None` if this node type lacks it.
    pub fn field_mut(&mut self, field: NodeField) -> Option<&mut f64> {
        match field {
            NodeField::ItemSpacing => self.kind.layout_mut().map(|l| &mut l.item_spacing),
            NodeField::PaddingLeft => self.kind.layout_mut().map(|l| &mut l.padding_left),
            NodeField::PaddingRight => self.kind.layout_mut().map(|l| &mut l.padding_right),
            NodeField::PaddingTop => self.kind.layout_mut().map(|l| &mut l.padding_top),
            NodeField::PaddingBottom => self.kind.layout_mut().map(|l| &mut l.padding_bottom),
            NodeField::TopLeftRadius => self.kind.corners_mut().map(|c| &mut c.top_left_radius),
            NodeField::TopRightRadius => self.kind.corners_mut().map(|c| &mut c.top_right_radius),
            NodeField::BottomLeftRadius => {
                self.kind.corners_mut().map(|c| &mut c.bottom_left_radius)
            }
            NodeField::BottomRightRadius => {
                self.kind.corners_mut().map(|c| &mut c.bottom_right_radius)
            }
        }
    }

    pub fn bound_variable(&self, field: NodeField) -> Option<&VariableId> {
        self.bound_variables.get(&field)
    }

    pub fn is_bound(&self, field: NodeField) -> bool {
        self.bound_variables.contains_key(&field)
    }
}
