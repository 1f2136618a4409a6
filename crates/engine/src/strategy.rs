//! Query strategy selection and the three set-query strategies
//!
//! Fetching the rows of an id set can be done three ways, with very
//! different cost profiles:
//! - [`NativeSetQuery`]: one round trip parameterized by the whole set,
//!   available only when the backend supports set-valued predicates
//! - [`OneByOneQuery`]: one round trip per id, lazily chained
//! - [`FullScanQuery`]: one unfiltered pass over the whole table with
//!   client-side membership filtering
//!
//! [`StrategyChooser`] picks between them from the ratio of the requested
//! set size to the (cached) table size: past the threshold, one linear pass
//! beats many small lookups.

use crate::config::ListerConfig;
use parking_lot::Mutex;
use samplist_core::cursor::{ChainCursor, ChainFetch, FilterCursor, RowCursor};
use samplist_core::property::{PropertyRow, PropertyVariant};
use samplist_core::sample::SampleRow;
use samplist_core::store::{PropertyCursor, SampleCursor, SampleStore};
use samplist_core::types::{IdSet, SampleId};
use samplist_core::ListResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

// ============================================================================
// Strategy choice
// ============================================================================

/// The three interchangeable set-query strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Single batched round trip (requires set-predicate support).
    SetBased,
    /// One lazily-chained call per id.
    OneByOne,
    /// Stream the whole table, filter client-side.
    FullScan,
}

/// Pure strategy policy.
///
/// Full scan once the requested set reaches `threshold` of the table;
/// otherwise the native set strategy when the backend supports it, falling
/// back to one-by-one.
pub fn choose_strategy(
    requested: usize,
    total: u64,
    supports_sets: bool,
    threshold: f64,
) -> StrategyKind {
    if requested as f64 >= threshold * total as f64 {
        StrategyKind::FullScan
    } else if supports_sets {
        StrategyKind::SetBased
    } else {
        StrategyKind::OneByOne
    }
}

/// Clock-gated cache of the total table row count.
///
/// Holds a (fetched-at, value) pair behind a mutex; the value is reused
/// until it is older than `max_age`. The caller passes `now` explicitly, so
/// tests can fabricate staleness without sleeping. A stale count only
/// affects strategy choice, never correctness.
pub struct CachedCount {
    max_age: Duration,
    slot: Mutex<Option<(Instant, u64)>>,
}

impl CachedCount {
    /// Empty cache with the given maximum age.
    pub fn new(max_age: Duration) -> Self {
        CachedCount {
            max_age,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, refreshing through `refresh` when absent or
    /// older than the maximum age.
    ///
    /// # Errors
    ///
    /// Propagates the refresh error; the stale value is not reused after a
    /// failed refresh.
    pub fn get_or_refresh(
        &self,
        now: Instant,
        refresh: impl FnOnce() -> ListResult<u64>,
    ) -> ListResult<u64> {
        let mut slot = self.slot.lock();
        if let Some((fetched_at, value)) = *slot {
            if now.saturating_duration_since(fetched_at) < self.max_age {
                return Ok(value);
            }
        }
        let value = refresh()?;
        *slot = Some((now, value));
        Ok(value)
    }

    /// Seed the cache with a value as of `now`. Used by tests to simulate a
    /// stale count.
    pub fn prime(&self, now: Instant, value: u64) {
        *self.slot.lock() = Some((now, value));
    }
}

/// Picks a set-query strategy for a requested id-set size.
///
/// The only state shared between listing calls: the cached table count.
pub struct StrategyChooser {
    store: Arc<dyn SampleStore>,
    threshold: f64,
    count: CachedCount,
}

impl StrategyChooser {
    /// Chooser over the given store, configured from `config`.
    pub fn new(store: Arc<dyn SampleStore>, config: &ListerConfig) -> Self {
        StrategyChooser {
            store,
            threshold: config.full_scan_threshold,
            count: CachedCount::new(config.count_max_age()),
        }
    }

    /// Choose a strategy for a requested set of `requested` ids as of `now`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the table count needed a refresh and the
    /// count query failed.
    pub fn choose(&self, requested: usize, now: Instant) -> ListResult<StrategyKind> {
        let total = self
            .count
            .get_or_refresh(now, || self.store.count_all())?;
        let kind = choose_strategy(
            requested,
            total,
            self.store.supports_set_predicates(),
            self.threshold,
        );
        debug!(requested, total, ?kind, "chose set-query strategy");
        Ok(kind)
    }

    /// Choose a strategy and build the matching [`SetQuery`].
    ///
    /// # Errors
    ///
    /// Returns a backend error if the count refresh failed.
    pub fn set_query(&self, requested: usize, now: Instant) -> ListResult<Box<dyn SetQuery>> {
        let kind = self.choose(requested, now)?;
        Ok(make_set_query(kind, Arc::clone(&self.store)))
    }

    /// Test access to the underlying count cache.
    pub fn count_cache(&self) -> &CachedCount {
        &self.count
    }
}

// ============================================================================
// Set-query strategies
// ============================================================================

/// A set-parameterized fetch of sample rows and property rows.
///
/// All implementations return the same row set for the same id set; they
/// differ only in round-trip count and memory profile.
pub trait SetQuery: Send {
    /// Fetch the sample rows of an id set.
    ///
    /// # Errors
    ///
    /// Returns an error if a store call fails; a failed fetch aborts the
    /// whole call, no partial results are silently dropped.
    fn fetch_samples(&self, ids: &IdSet) -> ListResult<SampleCursor>;

    /// Fetch the property rows of one variant for an id set.
    ///
    /// # Errors
    ///
    /// Returns an error if a store call fails.
    fn fetch_properties(&self, variant: PropertyVariant, ids: &IdSet)
        -> ListResult<PropertyCursor>;
}

/// Build the strategy implementation for a chosen kind.
pub fn make_set_query(kind: StrategyKind, store: Arc<dyn SampleStore>) -> Box<dyn SetQuery> {
    match kind {
        StrategyKind::SetBased => Box::new(NativeSetQuery { store }),
        StrategyKind::OneByOne => Box::new(OneByOneQuery { store }),
        StrategyKind::FullScan => Box::new(FullScanQuery { store }),
    }
}

/// Single batched round trip via the backend's set predicate.
pub struct NativeSetQuery {
    store: Arc<dyn SampleStore>,
}

impl SetQuery for NativeSetQuery {
    fn fetch_samples(&self, ids: &IdSet) -> ListResult<SampleCursor> {
        self.store.get_by_ids(ids)
    }

    fn fetch_properties(
        &self,
        variant: PropertyVariant,
        ids: &IdSet,
    ) -> ListResult<PropertyCursor> {
        self.store.property_rows(variant, ids)
    }
}

/// One backend call per id, issued lazily as the consumer pulls.
pub struct OneByOneQuery {
    store: Arc<dyn SampleStore>,
}

impl SetQuery for OneByOneQuery {
    fn fetch_samples(&self, ids: &IdSet) -> ListResult<SampleCursor> {
        let store = Arc::clone(&self.store);
        let fetch: ChainFetch<SampleRow> =
            Box::new(move |id| Ok(store.get_by_id(id)?.into_iter().collect()));
        Ok(Box::new(ChainCursor::new(ids.clone(), fetch)))
    }

    fn fetch_properties(
        &self,
        variant: PropertyVariant,
        ids: &IdSet,
    ) -> ListResult<PropertyCursor> {
        let store = Arc::clone(&self.store);
        let fetch: ChainFetch<PropertyRow> = Box::new(move |id| {
            let single: IdSet = std::iter::once(id).collect();
            store.property_rows(variant, &single)?.collect_rows()
        });
        Ok(Box::new(ChainCursor::new(ids.clone(), fetch)))
    }
}

/// One unfiltered pass over the whole table with client-side filtering.
///
/// The filter consumes the stream; it never mutates the source.
pub struct FullScanQuery {
    store: Arc<dyn SampleStore>,
}

impl SetQuery for FullScanQuery {
    fn fetch_samples(&self, ids: &IdSet) -> ListResult<SampleCursor> {
        let all = self.store.stream_all()?;
        Ok(Box::new(FilterCursor::new(all, ids.clone(), |row| row.id)))
    }

    fn fetch_properties(
        &self,
        variant: PropertyVariant,
        ids: &IdSet,
    ) -> ListResult<PropertyCursor> {
        let all = self.store.stream_all_properties(variant)?;
        Ok(Box::new(FilterCursor::new(all, ids.clone(), |row| {
            row.sample_id
        })))
    }
}
