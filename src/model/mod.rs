//! # Linter Data Model
//!
//! DTOs that cross every boundary: host ↔ token pipeline ↔ detector ↔ session.
//!
//! Design rule: no host handles here. This module is pure data: no I/O,
//! no state, no async.

pub mod token;
pub mod node;
pub mod issue;

pub use token::{
    VariableId, ResolvedType, Rgba, VariableValue, ModeValue, TokenRecord,
    LibraryVariableStub, LibraryCollection, CollectionSource, CollectionDescriptor, Token,
};
pub use node::{
    NodeId, NodeField, LayoutMode, AutoLayout, CornerRadii, NodeKind, SceneNode,
};
pub use issue::{Category, IssueProperty, Issue};
