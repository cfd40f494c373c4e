//! Per-node decision policies.
//!
//! Coarsest grouping first: all four edges, then a horizontal or vertical
//! pair, then single edges. A grouping is only used when none of its
//! members is already bound; a partial binding forces the finer grain.

use smallvec::SmallVec;

use crate::model::{CornerRadii, Issue, IssueProperty, NodeField, SceneNode};
use crate::tokens::TokenIndex;

/// Issues found on one node. Spacing yields at most five, radius four.
pub type NodeIssues = SmallVec<[Issue; 5]>;

fn issue(node: &SceneNode, property: IssueProperty, value: f64, index: &TokenIndex) -> Issue {
    Issue::new(
        node.id.clone(),
        node.name.clone(),
        property,
        value,
        index.get(value).cloned(),
    )
}

/// Spacing issues of a layout container. Nodes without layout, or with
/// layout disabled, produce none.
pub fn spacing_issues(node: &SceneNode, index: &TokenIndex) -> NodeIssues {
    let mut out = NodeIssues::new();
    let Some(layout) = node.kind.layout() else {
        return out;
    };
    if !layout.is_enabled() {
        return out;
    }

    if layout.item_spacing > 0.0 && !node.is_bound(NodeField::ItemSpacing) {
        out.push(issue(node, IssueProperty::ItemSpacing, layout.item_spacing, index));
    }

    let (left, right) = (layout.padding_left, layout.padding_right);
    let (top, bottom) = (layout.padding_top, layout.padding_bottom);
    let bound = |f| node.is_bound(f);
    let any_edge_bound = bound(NodeField::PaddingLeft)
        || bound(NodeField::PaddingRight)
        || bound(NodeField::PaddingTop)
        || bound(NodeField::PaddingBottom);

    if left > 0.0 && left == right && left == top && left == bottom && !any_edge_bound {
        out.push(issue(node, IssueProperty::PaddingAll, left, index));
        return out;
    }

    edge_pair(
        node,
        index,
        &mut out,
        (left, NodeField::PaddingLeft),
        (right, NodeField::PaddingRight),
        IssueProperty::HorizontalPadding,
    );
    edge_pair(
        node,
        index,
        &mut out,
        (top, NodeField::PaddingTop),
        (bottom, NodeField::PaddingBottom),
        IssueProperty::VerticalPadding,
    );
    out
}

/// One pair of opposite edges: a pair issue when both match and are free,
/// else each positive unbound edge on its own.
fn edge_pair(
    node: &SceneNode,
    index: &TokenIndex,
    out: &mut NodeIssues,
    (a, a_field): (f64, NodeField),
    (b, b_field): (f64, NodeField),
    pair: IssueProperty,
) {
    let (a_bound, b_bound) = (node.is_bound(a_field), node.is_bound(b_field));
    if a > 0.0 && a == b && !a_bound && !b_bound {
        out.push(issue(node, pair, a, index));
        return;
    }
    if a > 0.0 && !a_bound {
        out.push(issue(node, IssueProperty::from_field(a_field), a, index));
    }
    if b > 0.0 && !b_bound {
        out.push(issue(node, IssueProperty::from_field(b_field), b, index));
    }
}

/// Corner-radius issues of a node exposing all four corners.
pub fn radius_issues(node: &SceneNode, index: &TokenIndex) -> NodeIssues {
    let mut out = NodeIssues::new();
    let Some(&CornerRadii {
        top_left_radius: tl,
        top_right_radius: tr,
        bottom_left_radius: bl,
        bottom_right_radius: br,
    }) = node.kind.corners()
    else {
        return out;
    };

    let any_bound = NodeField::RADIUS.iter().any(|f| node.is_bound(*f));
    if tl > 0.0 && tl == tr && tl == bl && tl == br && !any_bound {
        out.push(issue(node, IssueProperty::BorderRadiusAll, tl, index));
        return out;
    }

    for (field, value) in [
        (NodeField::TopLeftRadius, tl),
        (NodeField::TopRightRadius, tr),
        (NodeField::BottomLeftRadius, bl),
        (NodeField::BottomRightRadius, br),
    ] {
        if value > 0.0 && !node.is_bound(field) {
            out.push(issue(node, IssueProperty::from_field(field), value, index));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::model::{AutoLayout, Category, LayoutMode, NodeKind, TokenRecord};
    use crate::tokens::classify;

    fn index(values: &[(&str, f64)]) -> TokenIndex {
        let records: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, (name, v))| Arc::new(TokenRecord::float(format!("v:{i}"), format!("k{i}"), *name, "c", *v)))
            .collect();
        let mut tokens = classify(&records, Category::Spacing, None);
        tokens.extend(classify(&records, Category::BorderRadius, None));
        TokenIndex::build(&tokens)
    }

    fn padded(l: f64, r: f64, t: f64, b: f64) -> SceneNode {
        SceneNode::new(
            "n",
            NodeKind::frame(AutoLayout {
                layout_mode: LayoutMode::Vertical,
                item_spacing: 0.0,
                padding_left: l,
                padding_right: r,
                padding_top: t,
                padding_bottom: b,
            }),
        )
    }

    fn props(issues: &NodeIssues) -> Vec<IssueProperty> {
        issues.iter().map(|i| i.property).collect()
    }

    #[test]
    fn test_uniform_padding_is_one_issue() {
        let issues = spacing_issues(&padded(8.0, 8.0, 8.0, 8.0), &index(&[("space-sm", 8.0)]));
        assert_eq!(props(&issues), vec![IssueProperty::PaddingAll]);
        assert_eq!(issues[0].matching_token.as_ref().unwrap().name, "space-sm");
    }

    #[test]
    fn test_partial_binding_decomposes() {
        let node = padded(8.0, 8.0, 8.0, 8.0).with_binding(NodeField::PaddingTop, "v:x");
        let issues = spacing_issues(&node, &TokenIndex::default());
        assert_eq!(
            props(&issues),
            vec![IssueProperty::HorizontalPadding, IssueProperty::PaddingBottom]
        );
    }

    #[test]
    fn test_pairs_and_single_edges() {
        let issues = spacing_issues(&padded(12.0, 12.0, 4.0, 0.0), &TokenIndex::default());
        assert_eq!(
            props(&issues),
            vec![IssueProperty::HorizontalPadding, IssueProperty::PaddingTop]
        );

        let issues = spacing_issues(&padded(4.0, 6.0, 10.0, 10.0), &TokenIndex::default());
        assert_eq!(
            props(&issues),
            vec![IssueProperty::PaddingLeft, IssueProperty::PaddingRight, IssueProperty::VerticalPadding]
        );
    }

    #[test]
    fn test_layout_disabled_or_zero_yields_nothing() {
        let mut node = padded(8.0, 8.0, 8.0, 8.0);
        if let Some(layout) = node.kind.layout_mut() {
            layout.layout_mode = LayoutMode::None;
        }
        assert!(spacing_issues(&node, &TokenIndex::default()).is_empty());
        assert!(spacing_issues(&padded(0.0, 0.0, 0.0, 0.0), &TokenIndex::default()).is_empty());
    }

    #[test]
    fn test_item_spacing_unfixable_message() {
        let mut node = padded(0.0, 0.0, 0.0, 0.0);
        if let Some(layout) = node.kind.layout_mut() {
            layout.item_spacing = 15.0;
        }
        let issues = spacing_issues(&node, &index(&[("space-md", 16.0)]));
        assert_eq!(props(&issues), vec![IssueProperty::ItemSpacing]);
        assert!(issues[0].matching_token.is_none());
        assert_eq!(issues[0].message, "No exact token for 15px gap");
    }

    #[test]
    fn test_radius_policy() {
        let rect = |c: CornerRadii| SceneNode::new("r", NodeKind::Rectangle { corners: c });
        let idx = index(&[("radius-sm", 4.0)]);

        let issues = radius_issues(&rect(CornerRadii::uniform(4.0)), &idx);
        assert_eq!(props(&issues), vec![IssueProperty::BorderRadiusAll]);
        assert!(issues[0].is_fixable());

        let bound = rect(CornerRadii::uniform(4.0)).with_binding(NodeField::TopLeftRadius, "v:0");
        assert_eq!(
            props(&radius_issues(&bound, &idx)),
            vec![
                IssueProperty::TopRightRadius,
                IssueProperty::BottomLeftRadius,
                IssueProperty::BottomRightRadius
            ]
        );

        let mixed = CornerRadii { top_left_radius: 4.0, bottom_right_radius: 2.0, ..Default::default() };
        assert_eq!(
            props(&radius_issues(&rect(mixed), &idx)),
            vec![IssueProperty::TopLeftRadius, IssueProperty::BottomRightRadius]
        );

        assert!(radius_issues(&SceneNode::new("t", NodeKind::Text), &idx).is_empty());
    }
}
