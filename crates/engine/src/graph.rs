//! Listing result graph
//!
//! A [`ResultGraph`] owns every sample a listing call materialized, primary
//! and dependent alike, keyed by id. Relationship fields on the samples
//! (`generated_from`, `container`) are ids into this graph. Primary samples
//! additionally keep their selector-match order.

use crate::enrich::PropertyHolderResolver;
use rustc_hash::FxHashMap;
use samplist_core::sample::Sample;
use samplist_core::types::{IdSet, SampleId};

/// The samples materialized by one listing call.
#[derive(Debug, Default)]
pub struct ResultGraph {
    samples: FxHashMap<SampleId, Sample>,
    primary_order: Vec<SampleId>,
}

impl ResultGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of samples, primary and dependent.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the graph holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of primary samples.
    pub fn primary_count(&self) -> usize {
        self.primary_order.len()
    }

    /// Number of dependent samples.
    pub fn dependent_count(&self) -> usize {
        self.samples.len() - self.primary_order.len()
    }

    /// True if a sample with this id is in the graph.
    pub fn contains(&self, id: SampleId) -> bool {
        self.samples.contains_key(&id)
    }

    /// The sample with this id, if present.
    pub fn get(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(&id)
    }

    /// Mutable access to the sample with this id.
    pub fn get_mut(&mut self, id: SampleId) -> Option<&mut Sample> {
        self.samples.get_mut(&id)
    }

    /// Insert a primary sample, recording its position in selector-match
    /// order. A second insert of the same id is ignored.
    pub fn insert_primary(&mut self, sample: Sample) {
        let id = sample.id;
        if self.samples.contains_key(&id) {
            return;
        }
        self.samples.insert(id, sample);
        self.primary_order.push(id);
    }

    /// Insert a dependent sample. A second insert of the same id is ignored.
    pub fn insert_dependent(&mut self, sample: Sample) {
        self.samples.entry(sample.id).or_insert(sample);
    }

    /// The primary samples in selector-match order.
    pub fn primaries(&self) -> impl Iterator<Item = &Sample> {
        self.primary_order
            .iter()
            .filter_map(|id| self.samples.get(id))
    }

    /// All samples, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }

    /// Ids of the primary samples.
    pub fn primary_ids(&self) -> IdSet {
        self.primary_order.iter().copied().collect()
    }

    /// Ids of every sample in the graph.
    pub fn all_ids(&self) -> IdSet {
        self.samples.keys().copied().collect()
    }
}

impl PropertyHolderResolver for ResultGraph {
    fn resolve(&mut self, id: SampleId) -> Option<&mut Sample> {
        self.get_mut(id)
    }
}
