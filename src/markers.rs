//! Issue markers: small shapes drawn next to nodes that have issues.
//!
//! | category | fixable | shape | color |
//! |----------|---------|-------|-------|
//! | spacing | yes | circle | green |
//! | spacing | no | circle | red |
//! | radius | yes | square | blue |
//! | radius | no | square | orange |

use crate::host::{HostBackend, MarkerKind, MarkerShape, MarkerSpec};
use crate::model::{Category, Rgba, SceneNode};
use crate::Result;

const GREEN: Rgba = Rgba { r: 0.2, g: 0.78, b: 0.35, a: 1.0 };
const RED: Rgba = Rgba { r: 0.94, g: 0.27, b: 0.23, a: 1.0 };
const BLUE: Rgba = Rgba { r: 0.2, g: 0.47, b: 0.96, a: 1.0 };
const ORANGE: Rgba = Rgba { r: 1.0, g: 0.6, b: 0.0, a: 1.0 };

/// Draws and clears markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerAnnotator {
    offset: f64,
    size: f64,
}

impl MarkerAnnotator {
    pub fn new(offset: f64, size: f64) -> Self {
        Self { offset, size }
    }

    /// The marker that would be drawn for `node`.
    ///
    /// Spacing markers sit at the node's origin minus the offset; radius
    /// markers sit one marker-width to the right of that, so a node with both
    /// kinds of issue shows both.
    pub fn spec_for(&self, node: &SceneNode, fixable: bool, category: Category) -> MarkerSpec {
        let shift = match category {
            Category::Spacing => 0.0,
            Category::BorderRadius => self.size,
        };
        let (shape, color) = match (category, fixable) {
            (Category::Spacing, true) => (MarkerShape::Circle, GREEN),
            (Category::Spacing, false) => (MarkerShape::Circle, RED),
            (Category::BorderRadius, true) => (MarkerShape::Square, BLUE),
            (Category::BorderRadius, false) => (MarkerShape::Square, ORANGE),
        };
        MarkerSpec {
            kind: MarkerKind::for_category(category),
            marker_for: node.id.clone(),
            fixable,
            shape,
            color,
            x: node.x - self.offset + shift,
            y: node.y - self.offset,
            size: self.size,
        }
    }

    /// Replace this node's marker of the same category with a fresh one.
    pub async fn mark<H: HostBackend>(
        &self,
        host: &H,
        node: &SceneNode,
        fixable: bool,
        category: Category,
    ) -> Result<()> {
        let kind = MarkerKind::for_category(category);
        for existing in host.page_markers().await? {
            if existing.kind() == Some(kind) && existing.marker_for.as_ref() == Some(&node.id) {
                host.remove_marker(&existing.id).await?;
            }
        }
        host.create_marker(self.spec_for(node, fixable, category)).await?;
        Ok(())
    }

    /// Remove every recognized marker on the page. Returns how many went.
    pub async fn clear_all<H: HostBackend>(&self, host: &H) -> Result<usize> {
        let mut removed = 0;
        for marker in host.page_markers().await? {
            if marker.kind().is_some() && host.remove_marker(&marker.id).await? {
                removed += 1;
            }
        }
        tracing::info!(removed, "cleared issue markers");
        Ok(removed)
    }
}

impl Default for MarkerAnnotator {
    fn default() -> Self {
        Self::new(8.0, 12.0)
    }
}
