//! Issues: unbound spacing or radius values found on a node.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NodeField, NodeId, Token};

/// Token family a detection pass works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Spacing,
    BorderRadius,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Spacing => f.write_str("spacing"),
            Category::BorderRadius => f.write_str("border-radius"),
        }
    }
}

/// The logical property an issue is about. Composite variants cover several fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueProperty {
    ItemSpacing,
    PaddingAll,
    HorizontalPadding,
    VerticalPadding,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    BorderRadiusAll,
    TopLeftRadius,
    TopRightRadius,
    BottomLeftRadius,
    BottomRightRadius,
}

impl IssueProperty {
    /// Underlying node fields, in binding order.
    pub fn fields(&self) -> &'static [NodeField] {
        use NodeField::*;
        match self {
            IssueProperty::ItemSpacing => &[ItemSpacing],
            IssueProperty::PaddingAll => &[PaddingLeft, PaddingRight, PaddingTop, PaddingBottom],
            IssueProperty::HorizontalPadding => &[PaddingLeft, PaddingRight],
            IssueProperty::VerticalPadding => &[PaddingTop, PaddingBottom],
            IssueProperty::PaddingLeft => &[PaddingLeft],
            IssueProperty::PaddingRight => &[PaddingRight],
            IssueProperty::PaddingTop => &[PaddingTop],
            IssueProperty::PaddingBottom => &[PaddingBottom],
            IssueProperty::BorderRadiusAll => {
                &[TopLeftRadius, TopRightRadius, BottomLeftRadius, BottomRightRadius]
            }
            IssueProperty::TopLeftRadius => &[TopLeftRadius],
            IssueProperty::TopRightRadius => &[TopRightRadius],
            IssueProperty::BottomLeftRadius => &[BottomLeftRadius],
            IssueProperty::BottomRightRadius => &[BottomRightRadius],
        }
    }

    pub fn from_field(field: NodeField) -> Self {
        match field {
            NodeField::ItemSpacing => IssueProperty::ItemSpacing,
            NodeField::PaddingLeft => IssueProperty::PaddingLeft,
            NodeField::PaddingRight => IssueProperty::PaddingRight,
            NodeField::PaddingTop => IssueProperty::PaddingTop,
            NodeField::PaddingBottom => IssueProperty::PaddingBottom,
            NodeField::TopLeftRadius => IssueProperty::TopLeftRadius,
            NodeField::TopRightRadius => IssueProperty::TopRightRadius,
            NodeField::BottomLeftRadius => IssueProperty::BottomLeftRadius,
            NodeField::BottomRightRadius => IssueProperty::BottomRightRadius,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.fields().len() > 1
    }

    pub fn category(&self) -> Category {
        if self.fields()[0].is_radius() {
            Category::BorderRadius
        } else {
            Category::Spacing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueProperty::ItemSpacing => "itemSpacing",
            IssueProperty::PaddingAll => "paddingAll",
            IssueProperty::HorizontalPadding => "horizontalPadding",
            IssueProperty::VerticalPadding => "verticalPadding",
            IssueProperty::PaddingLeft => "paddingLeft",
            IssueProperty::PaddingRight => "paddingRight",
            IssueProperty::PaddingTop => "paddingTop",
            IssueProperty::PaddingBottom => "paddingBottom",
            IssueProperty::BorderRadiusAll => "borderRadiusAll",
            IssueProperty::TopLeftRadius => "topLeftRadius",
            IssueProperty::TopRightRadius => "topRightRadius",
            IssueProperty::BottomLeftRadius => "bottomLeftRadius",
            IssueProperty::BottomRightRadius => "bottomRightRadius",
        }
    }

    /// Human wording used in issue messages.
    pub fn label(&self) -> &'static str {
        match self {
            IssueProperty::ItemSpacing => "gap",
            IssueProperty::PaddingAll => "padding",
            IssueProperty::HorizontalPadding => "horizontal padding",
            IssueProperty::VerticalPadding => "vertical padding",
            IssueProperty::PaddingLeft => "left padding",
            IssueProperty::PaddingRight => "right padding",
            IssueProperty::PaddingTop => "top padding",
            IssueProperty::PaddingBottom => "bottom padding",
            IssueProperty::BorderRadiusAll => "corner radius",
            IssueProperty::TopLeftRadius => "top-left radius",
            IssueProperty::TopRightRadius => "top-right radius",
            IssueProperty::BottomLeftRadius => "bottom-left radius",
            IssueProperty::BottomRightRadius => "bottom-right radius",
        }
    }
}

impl fmt::Display for IssueProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hard-coded value on a node, with the token it could bind to (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub node_id: NodeId,
    pub node_name: String,
    pub property: IssueProperty,
    pub value: f64,
    pub matching_token: Option<Token>,
    pub message: String,
}

impl Issue {
    pub fn new(
        node_id: NodeId,
        node_name: impl Into<String>,
        property: IssueProperty,
        value: f64,
        matching_token: Option<Token>,
    ) -> Self {
        let message = match &matching_token {
            Some(token) => format!(
                "Map {value}px {} to {} ({}px)",
                property.label(),
                token.name,
                token.value
            ),
            None => format!("No exact token for {value}px {}", property.label()),
        };
        Self {
            node_id,
            node_name: node_name.into(),
            property,
            value,
            matching_token,
            message,
        }
    }

    pub fn is_fixable(&self) -> bool {
        self.matching_token.is_some()
    }

    pub fn category(&self) -> Category {
        self.property.category()
    }
}
