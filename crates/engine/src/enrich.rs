//! Property enrichment
//!
//! [`PropertyEnricher`] attaches typed property values to a batch of
//! samples: for each of the three value variants it fetches all matching
//! rows for the id set (through the strategy chosen for the batch size),
//! resolves the owning sample through a [`PropertyHolderResolver`], and
//! appends the value to the sample's bag.
//!
//! Descriptor caching happens at two lifetimes:
//! - property types live in a process-lifetime [`PropertyTypeCatalog`]
//! - vocabulary terms and materials are de-duplicated per enrichment call,
//!   so all values referencing the same term share one `Arc`

use crate::strategy::StrategyChooser;
use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use samplist_core::cursor::RowCursor;
use samplist_core::property::{
    MaterialRef, PropertyPayload, PropertyType, PropertyValue, PropertyVariant, TypedValue,
    VocabularyTerm,
};
use samplist_core::sample::Sample;
use samplist_core::store::SampleStore;
use samplist_core::types::{IdSet, MaterialId, PropertyTypeId, SampleId, VocabularyTermId};
use samplist_core::ListResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Mutable access to the samples being enriched.
///
/// Keeps the enricher independent of how the caller stores its samples; the
/// result graph implements this over its arena. Returning `None` means the
/// sample is unknown to the caller and the row is skipped.
pub trait PropertyHolderResolver {
    /// Look up the sample a property row belongs to.
    fn resolve(&mut self, id: SampleId) -> Option<&mut Sample>;
}

/// Process-lifetime cache of property type descriptors.
///
/// Loaded from the store once, on first use, and shared between all listing
/// calls. Property types change through admin operations only, which in
/// this deployment require a restart.
#[derive(Default)]
pub struct PropertyTypeCatalog {
    types: OnceCell<FxHashMap<PropertyTypeId, Arc<PropertyType>>>,
}

impl PropertyTypeCatalog {
    /// Empty, not-yet-loaded catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor for a property type id, loading the catalog on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the initial catalog load fails.
    pub fn get(
        &self,
        store: &dyn SampleStore,
        id: PropertyTypeId,
    ) -> ListResult<Option<Arc<PropertyType>>> {
        let types = self.types.get_or_try_init(|| -> ListResult<_> {
            let mut map = FxHashMap::default();
            for property_type in store.property_types()? {
                map.insert(property_type.id, Arc::new(property_type));
            }
            debug!(types = map.len(), "loaded property type catalog");
            Ok(map)
        })?;
        Ok(types.get(&id).cloned())
    }

    /// All descriptors, loading the catalog on first use.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the initial catalog load fails.
    pub fn all(&self, store: &dyn SampleStore) -> ListResult<Vec<Arc<PropertyType>>> {
        // Loading through get() with a throwaway id keeps one init path.
        self.get(store, PropertyTypeId::new(0))?;
        Ok(self
            .types
            .get()
            .map(|types| types.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// Per-call dedup key: the value payload of a property row.
#[derive(PartialEq, Eq, Hash)]
enum ValueKey {
    Generic(String),
    Term(VocabularyTermId),
    Material(MaterialId),
}

/// Attaches typed property values to batches of samples.
pub struct PropertyEnricher {
    store: Arc<dyn SampleStore>,
    chooser: Arc<StrategyChooser>,
    catalog: Arc<PropertyTypeCatalog>,
}

impl PropertyEnricher {
    /// Enricher over the given store, strategy chooser and type catalog.
    pub fn new(
        store: Arc<dyn SampleStore>,
        chooser: Arc<StrategyChooser>,
        catalog: Arc<PropertyTypeCatalog>,
    ) -> Self {
        PropertyEnricher {
            store,
            chooser,
            catalog,
        }
    }

    /// Attach all property values of the given samples, in place.
    ///
    /// Per-call guarantees:
    /// - no duplicate (property type, value) pair is appended to the same
    ///   sample
    /// - all values referencing the same term or material share one `Arc`
    /// - rows whose sample or referenced term/material cannot be resolved
    ///   are skipped (concurrent deletes are expected)
    ///
    /// # Errors
    ///
    /// Returns a backend error if any store call fails; the samples may then
    /// be partially enriched and the caller must discard them.
    pub fn enrich(
        &self,
        ids: &IdSet,
        resolver: &mut dyn PropertyHolderResolver,
    ) -> ListResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let started = Instant::now();
        let mut term_cache: FxHashMap<VocabularyTermId, Arc<VocabularyTerm>> =
            FxHashMap::default();
        let mut material_cache: FxHashMap<MaterialId, Arc<MaterialRef>> = FxHashMap::default();
        let mut seen: FxHashSet<(SampleId, PropertyTypeId, ValueKey)> = FxHashSet::default();
        let mut attached = 0usize;

        for variant in PropertyVariant::ALL {
            let query = self.chooser.set_query(ids.len(), Instant::now())?;
            let mut rows = query.fetch_properties(variant, ids)?;
            while let Some(row) = rows.next_row()? {
                let Some(property_type) =
                    self.catalog.get(self.store.as_ref(), row.property_type_id)?
                else {
                    // Unknown property type: row references a descriptor
                    // deleted since the row was written.
                    continue;
                };
                let key = match &row.payload {
                    PropertyPayload::Generic(value) => ValueKey::Generic(value.clone()),
                    PropertyPayload::Term(term_id) => ValueKey::Term(*term_id),
                    PropertyPayload::Material(material_id) => ValueKey::Material(*material_id),
                };
                if !seen.insert((row.sample_id, row.property_type_id, key)) {
                    continue;
                }
                let value = match row.payload {
                    PropertyPayload::Generic(value) => TypedValue::Generic(value),
                    PropertyPayload::Term(term_id) => {
                        match self.resolve_term(term_id, &mut term_cache)? {
                            Some(term) => TypedValue::Term(term),
                            None => continue,
                        }
                    }
                    PropertyPayload::Material(material_id) => {
                        match self.resolve_material(material_id, &mut material_cache)? {
                            Some(material) => TypedValue::Material(material),
                            None => continue,
                        }
                    }
                };
                if let Some(sample) = resolver.resolve(row.sample_id) {
                    sample.properties.push(PropertyValue {
                        property_type,
                        value,
                    });
                    attached += 1;
                }
            }
        }
        debug!(
            samples = ids.len(),
            attached,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "property enrichment complete"
        );
        Ok(())
    }

    fn resolve_term(
        &self,
        id: VocabularyTermId,
        cache: &mut FxHashMap<VocabularyTermId, Arc<VocabularyTerm>>,
    ) -> ListResult<Option<Arc<VocabularyTerm>>> {
        if let Some(term) = cache.get(&id) {
            return Ok(Some(Arc::clone(term)));
        }
        match self.store.vocabulary_term(id)? {
            Some(term) => {
                let term = Arc::new(term);
                cache.insert(id, Arc::clone(&term));
                Ok(Some(term))
            }
            None => Ok(None),
        }
    }

    fn resolve_material(
        &self,
        id: MaterialId,
        cache: &mut FxHashMap<MaterialId, Arc<MaterialRef>>,
    ) -> ListResult<Option<Arc<MaterialRef>>> {
        if let Some(material) = cache.get(&id) {
            return Ok(Some(Arc::clone(material)));
        }
        match self.store.material(id)? {
            Some(material) => {
                let material = Arc::new(material);
                cache.insert(id, Arc::clone(&material));
                Ok(Some(material))
            }
            None => Ok(None),
        }
    }
}
