//! Time-boxed token and collection cache.
//!
//! Entries are keyed by `(category, scope)` where scope is a collection id
//! or `All`. An entry is served while `now - stored_at < ttl`; a forced
//! lookup or an explicit clear always goes back to the aggregator. The
//! lock is never held across an `.await`, so two concurrent misses both
//! aggregate (wasted work, same result).
//!
//! The last unfiltered list per category is also kept in a separate slot,
//! regardless of age. When a miss aggregates nothing at all on a host that
//! does have a variables API (every source failed), that list, narrowed to
//! the requested collection, is served instead and nothing is stored.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::host::HostBackend;
use crate::model::{Category, CollectionDescriptor, Token};
use super::aggregate::TokenAggregator;
use super::classify::classify;

// ============================================================================
// Clock
// ============================================================================

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replay.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// ============================================================================
// Cache state
// ============================================================================

/// Which collection a cached token list is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    All,
    Collection(String),
}

impl ScopeKey {
    pub fn from_filter(collection: Option<&str>) -> Self {
        match collection {
            Some(id) => ScopeKey::Collection(id.to_string()),
            None => ScopeKey::All,
        }
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: Arc<T>,
    stored_at: DateTime<Utc>,
}

impl<T> Entry<T> {
    fn new(value: Arc<T>, stored_at: DateTime<Utc>) -> Self {
        Self { value, stored_at }
    }

    fn fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.stored_at) < ttl
    }
}

#[derive(Debug, Default)]
struct CacheState {
    tokens: HashMap<(Category, ScopeKey), Entry<Vec<Token>>>,
    /// Last unfiltered token list per category.
    full: HashMap<Category, Entry<Vec<Token>>>,
    collections: Option<Entry<Vec<CollectionDescriptor>>>,
}

/// Counts after a global refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    pub spacing_tokens: usize,
    pub border_radius_tokens: usize,
    pub collections: usize,
}

// ============================================================================
// TokenCache
// ============================================================================

/// Memoizes aggregation + classification per `(category, scope)`.
pub struct TokenCache {
    aggregator: TokenAggregator,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    state: Mutex<CacheState>,
}

impl TokenCache {
    pub fn new(aggregator: TokenAggregator, ttl: Duration) -> Self {
        Self::with_clock(aggregator, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(aggregator: TokenAggregator, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator,
            clock,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn aggregator(&self) -> &TokenAggregator {
        &self.aggregator
    }

    /// Tokens of `category`, optionally limited to one collection.
    pub async fn get_tokens<H: HostBackend>(
        &self,
        host: &H,
        category: Category,
        collection: Option<&str>,
        force_refresh: bool,
    ) -> Arc<Vec<Token>> {
        let scope = ScopeKey::from_filter(collection);
        let slot = (category, scope.clone());

        if !force_refresh {
            let now = self.clock.now();
            let state = self.state.lock();
            if let Some(entry) = state.tokens.get(&slot) {
                if entry.fresh(now, self.ttl) {
                    tracing::debug!(%category, ?scope, "token cache hit");
                    return Arc::clone(&entry.value);
                }
            }
        }

        let records = self.aggregator.collect_all_candidates(host).await;
        if records.is_empty() && self.aggregator.capabilities().has_variables_api() {
            if let Some(last) = self.last_full(category, collection) {
                tracing::warn!(%category, ?scope, tokens = last.len(), "no token sources answered; serving last full list");
                return last;
            }
        }
        let tokens = Arc::new(classify(&records, category, collection));
        let stored_at = self.clock.now();
        tracing::debug!(%category, ?scope, tokens = tokens.len(), "token cache populated");

        let mut state = self.state.lock();
        if scope == ScopeKey::All {
            state.full.insert(category, Entry::new(Arc::clone(&tokens), stored_at));
        }
        state.tokens.insert(slot, Entry::new(Arc::clone(&tokens), stored_at));
        tokens
    }

    /// Local and library collection descriptors.
    pub async fn get_collections<H: HostBackend>(
        &self,
        host: &H,
        force_refresh: bool,
    ) -> Arc<Vec<CollectionDescriptor>> {
        if !force_refresh {
            let now = self.clock.now();
            let state = self.state.lock();
            if let Some(entry) = state.collections.as_ref().filter(|e| e.fresh(now, self.ttl)) {
                return Arc::clone(&entry.value);
            }
        }

        let collections = Arc::new(self.aggregator.collect_collections(host).await);
        let stored_at = self.clock.now();
        self.state.lock().collections = Some(Entry::new(Arc::clone(&collections), stored_at));
        collections
    }

    /// Last unfiltered list for `category`, any age, narrowed to `collection`.
    fn last_full(&self, category: Category, collection: Option<&str>) -> Option<Arc<Vec<Token>>> {
        let state = self.state.lock();
        let entry = state.full.get(&category)?;
        Some(match collection {
            None => Arc::clone(&entry.value),
            Some(id) => Arc::new(
                entry
                    .value
                    .iter()
                    .filter(|t| t.record.collection_id == id)
                    .cloned()
                    .collect(),
            ),
        })
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.tokens.clear();
        state.full.clear();
        state.collections = None;
    }

    /// Clear everything, then repopulate unfiltered tokens for both
    /// categories (one aggregation) and the collection list.
    pub async fn refresh_all<H: HostBackend>(&self, host: &H) -> RefreshSummary {
        self.clear();

        let records = self.aggregator.collect_all_candidates(host).await;
        let stored_at = self.clock.now();
        let mut summary = RefreshSummary::default();
        {
            let mut state = self.state.lock();
            for category in [Category::Spacing, Category::BorderRadius] {
                let tokens = Arc::new(classify(&records, category, None));
                match category {
                    Category::Spacing => summary.spacing_tokens = tokens.len(),
                    Category::BorderRadius => summary.border_radius_tokens = tokens.len(),
                }
                state.full.insert(category, Entry::new(Arc::clone(&tokens), stored_at));
                state.tokens.insert((category, ScopeKey::All), Entry::new(tokens, stored_at));
            }
        }

        summary.collections = self.get_collections(host, true).await.len();
        tracing::info!(
            spacing = summary.spacing_tokens,
            border_radius = summary.border_radius_tokens,
            collections = summary.collections,
            "token caches refreshed"
        );
        summary
    }
}
