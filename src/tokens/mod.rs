//! # Token Pipeline
//!
//! ```text
//! HostBackend ─▶ TokenAggregator ─▶ classify(category, scope) ─▶ TokenCache
//!                                                                  │
//!                                          TokenIndex::build ◀─────┘ (per detection pass)
//! ```

pub mod aggregate;
pub mod classify;
pub mod cache;

pub use aggregate::TokenAggregator;
pub use classify::{classify, is_candidate_name, name_matches, TokenIndex};
pub use cache::{Clock, ManualClock, RefreshSummary, ScopeKey, SystemClock, TokenCache};
