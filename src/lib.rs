//! # tokenlint — Design-Token Linter
//!
//! Finds layout spacing and corner radii in a design document that are set as
//! raw numbers instead of being bound to a design token, offers exact-value
//! token bindings, and can revert bindings back to static values.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `HostBackend` is the contract between the linter and the design tool
//! 2. **Clean DTOs**: `TokenRecord`, `SceneNode`, `Issue` cross all boundaries
//! 3. **Exact match only**: a value maps to a token only when the numbers are equal
//! 4. **Explicit state**: token caches live in a `TokenCache` owned by the `Session`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tokenlint::{MemoryHost, Session, UiRequest};
//!
//! # async fn example() -> tokenlint::Result<()> {
//! let host = MemoryHost::load("document.json".as_ref())?;
//! let session = Session::open_memory(host);
//!
//! let found = session
//!     .handle(UiRequest::FindAllIssues {
//!         spacing_collection_id: None,
//!         border_radius_collection_id: None,
//!     })
//!     .await;
//! println!("{}", serde_json::to_string(&found)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Host Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `MemoryHost` | JSON document snapshot, for testing, embedding and the CLI |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod host;
pub mod pool;
pub mod tokens;
pub mod markers;
pub mod detect;
pub mod bind;
pub mod config;
pub mod session;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Category, CollectionDescriptor, Issue, IssueProperty, NodeField, NodeId,
    NodeKind, SceneNode, Token, TokenRecord, VariableId,
};

// ============================================================================
// Re-exports: Host
// ============================================================================

pub use host::{
    Document, HostBackend, HostCapabilities, LibrarySnapshot, MarkerKind,
    MemoryHost,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use bind::{FixReport, RevertReport};
pub use config::LintConfig;
pub use detect::{DetectionReport, IssueDetector};
pub use markers::MarkerAnnotator;
pub use pool::BatchPool;
pub use session::{Session, UiRequest, UiResponse};
pub use tokens::{TokenAggregator, TokenCache, TokenIndex};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Host error: {0}")]
    Host(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Host capability unavailable: {0}")]
    Capability(String),

    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
