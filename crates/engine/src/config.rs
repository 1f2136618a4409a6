//! Engine configuration
//!
//! A [`ListerConfig`] is handed to the lister at construction time. The
//! defaults match the behavior of the production deployment: full scans kick
//! in once a requested set reaches a fifth of the table, and the cached
//! table count may be up to ten minutes stale.

use samplist_core::types::{InstanceId, RelationshipTypeId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ratio of requested-set size to table size above which a full
/// table scan beats many point lookups.
pub const DEFAULT_FULL_SCAN_THRESHOLD: f64 = 0.2;

/// Default maximum age of the cached total row count, in seconds.
pub const DEFAULT_COUNT_MAX_AGE_SECS: u64 = 600;

/// Configuration of a [`SampleLister`].
///
/// [`SampleLister`]: crate::worker::SampleLister
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListerConfig {
    /// Requested-set-to-table-size ratio above which the full-scan strategy
    /// is preferred.
    #[serde(default = "default_threshold")]
    pub full_scan_threshold: f64,
    /// Maximum age of the cached total row count, in seconds. A stale count
    /// only affects strategy choice, never correctness.
    #[serde(default = "default_count_max_age_secs")]
    pub count_max_age_secs: u64,
    /// Relationship type id of the generated-from lineage edge.
    pub parent_relationship: RelationshipTypeId,
    /// Database instance this lister serves. Rows belonging to a foreign
    /// instance are silently excluded from results.
    pub home_instance: InstanceId,
}

fn default_threshold() -> f64 {
    DEFAULT_FULL_SCAN_THRESHOLD
}

fn default_count_max_age_secs() -> u64 {
    DEFAULT_COUNT_MAX_AGE_SECS
}

impl Default for ListerConfig {
    fn default() -> Self {
        ListerConfig {
            full_scan_threshold: DEFAULT_FULL_SCAN_THRESHOLD,
            count_max_age_secs: DEFAULT_COUNT_MAX_AGE_SECS,
            parent_relationship: RelationshipTypeId::new(1),
            home_instance: InstanceId::new(1),
        }
    }
}

impl ListerConfig {
    /// The count max age as a [`Duration`].
    pub fn count_max_age(&self) -> Duration {
        Duration::from_secs(self.count_max_age_secs)
    }
}
