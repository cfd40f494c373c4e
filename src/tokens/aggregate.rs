//! Candidate aggregation across the local document and every enabled library.
//!
//! ```text
//! local variables ──┐
//!                   ├─▶ dedup by natural key (first seen wins) ─▶ Vec<Arc<TokenRecord>>
//! library stubs ─▶ name prefilter ─▶ batched import ─┘
//! ```
//!
//! Aggregation never fails as a whole: a source that errors contributes
//! nothing, and a single stub that fails to import is skipped.

use std::sync::Arc;

use hashbrown::HashSet;

use crate::host::{HostBackend, HostCapabilities};
use crate::model::{CollectionDescriptor, LibraryCollection, LibraryVariableStub, TokenRecord};
use crate::pool::BatchPool;
use super::classify::is_candidate_name;

/// Records in first-seen order with natural-key dedup.
#[derive(Debug, Default)]
struct CandidateSet {
    seen: HashSet<String>,
    records: Vec<Arc<TokenRecord>>,
}

impl CandidateSet {
    fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    fn insert(&mut self, record: TokenRecord) -> bool {
        if !self.seen.insert(record.key.clone()) {
            return false;
        }
        self.records.push(Arc::new(record));
        true
    }
}

/// Merges token candidates from all sources the host offers.
#[derive(Debug, Clone)]
pub struct TokenAggregator {
    capabilities: HostCapabilities,
    pool: BatchPool,
}

impl TokenAggregator {
    pub fn new(capabilities: HostCapabilities, pool: BatchPool) -> Self {
        Self { capabilities, pool }
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    /// Every candidate record, local first, then libraries in listing order.
    pub async fn collect_all_candidates<H: HostBackend>(&self, host: &H) -> Vec<Arc<TokenRecord>> {
        if !self.capabilities.has_variables_api() {
            tracing::warn!("host has no variables API; no tokens available");
            return Vec::new();
        }

        let mut set = CandidateSet::default();

        match host.local_variables().await {
            Ok(locals) => {
                for record in locals {
                    set.insert(record);
                }
            }
            Err(err) => tracing::warn!(%err, "failed to read local variables"),
        }
        let local_count = set.records.len();

        if self.capabilities.has_library_api() {
            match host.library_collections().await {
                Ok(collections) => {
                    for collection in &collections {
                        self.collect_library(host, collection, &mut set).await;
                    }
                }
                Err(err) => tracing::warn!(%err, "failed to list library collections"),
            }
        }

        tracing::info!(
            local = local_count,
            library = set.records.len() - local_count,
            "aggregated token candidates"
        );
        set.records
    }

    async fn collect_library<H: HostBackend>(
        &self,
        host: &H,
        collection: &LibraryCollection,
        set: &mut CandidateSet,
    ) {
        let stubs = match host.library_variables(&collection.key).await {
            Ok(stubs) => stubs,
            Err(err) => {
                tracing::warn!(collection = %collection.name, %err, "failed to list library variables");
                return;
            }
        };

        let mut requested = HashSet::new();
        let wanted: Vec<LibraryVariableStub> = stubs
            .into_iter()
            .filter(|stub| is_candidate_name(&stub.name))
            .filter(|stub| !set.contains(&stub.key) && requested.insert(stub.key.clone()))
            .collect();
        if wanted.is_empty() {
            return;
        }
        tracing::debug!(collection = %collection.name, stubs = wanted.len(), "importing library variables");

        let results = self
            .pool
            .run(wanted, |stub| async move {
                let result = host.import_variable(&stub.key).await;
                (stub, result)
            })
            .await;

        for (stub, result) in results {
            match result {
                Ok(record) => {
                    set.insert(record);
                }
                Err(err) => {
                    tracing::warn!(key = %stub.key, name = %stub.name, %err, "failed to import library variable");
                }
            }
        }
    }

    /// Local collections followed by library collections.
    pub async fn collect_collections<H: HostBackend>(&self, host: &H) -> Vec<CollectionDescriptor> {
        let mut out = Vec::new();
        if self.capabilities.local_collections {
            match host.local_collections().await {
                Ok(locals) => out.extend(locals),
                Err(err) => tracing::warn!(%err, "failed to read local collections"),
            }
        }
        if self.capabilities.has_library_api() {
            match host.library_collections().await {
                Ok(libs) => out.extend(libs.iter().map(CollectionDescriptor::from)),
                Err(err) => tracing::warn!(%err, "failed to list library collections"),
            }
        }
        out
    }
}
