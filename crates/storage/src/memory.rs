//! In-memory reference backend
//!
//! [`MemoryStore`] implements the full [`SampleStore`] contract over
//! `RwLock`-guarded maps. It is the fixture engine for the integration
//! tests and the reference a SQL implementation is checked against.
//!
//! Cursors snapshot the matching rows at call time, so a cursor stays valid
//! while the store keeps mutating underneath it.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use samplist_core::cursor::VecCursor;
use samplist_core::property::{
    MaterialRef, PropertyRow, PropertyType, PropertyVariant, VocabularyTerm,
};
use samplist_core::sample::{Experiment, Person, SampleRow, SampleType, Space};
use samplist_core::store::{
    EdgeDirection, PropertyCursor, RelationshipEdge, SampleCursor, SampleFilter, SampleStore,
};
use samplist_core::types::{
    Code, ExperimentId, IdSet, MaterialId, PermId, PersonId, PropertyTypeId, RelationshipTypeId,
    SampleId, SampleTypeId, SpaceId, VocabularyTermId,
};
use samplist_core::ListResult;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct Inner {
    samples: BTreeMap<SampleId, SampleRow>,
    by_code: FxHashMap<Code, SampleId>,
    by_perm_id: FxHashMap<PermId, SampleId>,
    edges: Vec<RelationshipEdge>,
    properties: Vec<PropertyRow>,
    sample_types: BTreeMap<SampleTypeId, SampleType>,
    spaces: BTreeMap<SpaceId, Space>,
    property_types: BTreeMap<PropertyTypeId, PropertyType>,
    experiments: FxHashMap<ExperimentId, Experiment>,
    persons: FxHashMap<PersonId, Person>,
    terms: FxHashMap<VocabularyTermId, VocabularyTerm>,
    materials: FxHashMap<MaterialId, MaterialRef>,
}

/// In-memory sample store.
///
/// Insertions go through `&self` (interior mutability), so a fixture can
/// keep evolving between listing calls without re-wiring the engine.
pub struct MemoryStore {
    set_predicates: bool,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Empty store that advertises native set-predicate support.
    pub fn new() -> Self {
        MemoryStore {
            set_predicates: true,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Empty store with explicit set-predicate capability.
    pub fn with_set_predicates(set_predicates: bool) -> Self {
        MemoryStore {
            set_predicates,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert or replace a sample row.
    pub fn add_sample(&self, row: SampleRow) {
        let mut inner = self.inner.write();
        inner.by_code.insert(row.code.clone(), row.id);
        inner.by_perm_id.insert(row.perm_id.clone(), row.id);
        inner.samples.insert(row.id, row);
    }

    /// Remove a sample row (simulates a concurrent delete).
    pub fn remove_sample(&self, id: SampleId) {
        let mut inner = self.inner.write();
        if let Some(row) = inner.samples.remove(&id) {
            inner.by_code.remove(&row.code);
            inner.by_perm_id.remove(&row.perm_id);
        }
    }

    /// Insert a relationship edge.
    pub fn add_edge(&self, edge: RelationshipEdge) {
        self.inner.write().edges.push(edge);
    }

    /// Insert a property row.
    pub fn add_property(&self, row: PropertyRow) {
        self.inner.write().properties.push(row);
    }

    /// Insert a sample type descriptor.
    pub fn add_sample_type(&self, sample_type: SampleType) {
        self.inner
            .write()
            .sample_types
            .insert(sample_type.id, sample_type);
    }

    /// Insert a space descriptor.
    pub fn add_space(&self, space: Space) {
        self.inner.write().spaces.insert(space.id, space);
    }

    /// Insert a property type descriptor.
    pub fn add_property_type(&self, property_type: PropertyType) {
        self.inner
            .write()
            .property_types
            .insert(property_type.id, property_type);
    }

    /// Insert an experiment descriptor.
    pub fn add_experiment(&self, experiment: Experiment) {
        self.inner.write().experiments.insert(experiment.id, experiment);
    }

    /// Insert a person descriptor.
    pub fn add_person(&self, person: Person) {
        self.inner.write().persons.insert(person.id, person);
    }

    /// Insert a vocabulary term.
    pub fn add_vocabulary_term(&self, term: VocabularyTerm) {
        self.inner.write().terms.insert(term.id, term);
    }

    /// Insert a material.
    pub fn add_material(&self, material: MaterialRef) {
        self.inner.write().materials.insert(material.id, material);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore for MemoryStore {
    fn supports_set_predicates(&self) -> bool {
        self.set_predicates
    }

    fn count_all(&self) -> ListResult<u64> {
        Ok(self.inner.read().samples.len() as u64)
    }

    fn get_by_id(&self, id: SampleId) -> ListResult<Option<SampleRow>> {
        Ok(self.inner.read().samples.get(&id).cloned())
    }

    fn get_by_code(&self, code: &Code) -> ListResult<Option<SampleRow>> {
        let inner = self.inner.read();
        Ok(inner
            .by_code
            .get(code)
            .and_then(|id| inner.samples.get(id))
            .cloned())
    }

    fn get_by_perm_id(&self, perm_id: &PermId) -> ListResult<Option<SampleRow>> {
        let inner = self.inner.read();
        Ok(inner
            .by_perm_id
            .get(perm_id)
            .and_then(|id| inner.samples.get(id))
            .cloned())
    }

    fn get_by_ids(&self, ids: &IdSet) -> ListResult<SampleCursor> {
        let inner = self.inner.read();
        let rows: Vec<SampleRow> = ids
            .iter()
            .filter_map(|id| inner.samples.get(id).cloned())
            .collect();
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn stream_all(&self) -> ListResult<SampleCursor> {
        let inner = self.inner.read();
        debug!(rows = inner.samples.len(), "streaming full sample table");
        let rows: Vec<SampleRow> = inner.samples.values().cloned().collect();
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn stream_filtered(&self, filter: &SampleFilter) -> ListResult<SampleCursor> {
        let inner = self.inner.read();
        let rows: Vec<SampleRow> = inner
            .samples
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn relationship_edges(
        &self,
        relationship: RelationshipTypeId,
        direction: EdgeDirection,
        ids: &IdSet,
    ) -> ListResult<Vec<RelationshipEdge>> {
        let inner = self.inner.read();
        Ok(inner
            .edges
            .iter()
            .filter(|edge| edge.relationship == relationship)
            .filter(|edge| match direction {
                EdgeDirection::TowardParents => ids.contains(&edge.child),
                EdgeDirection::TowardChildren => ids.contains(&edge.parent),
            })
            .copied()
            .collect())
    }

    fn property_rows(&self, variant: PropertyVariant, ids: &IdSet) -> ListResult<PropertyCursor> {
        let inner = self.inner.read();
        let rows: Vec<PropertyRow> = inner
            .properties
            .iter()
            .filter(|row| row.variant() == variant && ids.contains(&row.sample_id))
            .cloned()
            .collect();
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn stream_all_properties(&self, variant: PropertyVariant) -> ListResult<PropertyCursor> {
        let inner = self.inner.read();
        let rows: Vec<PropertyRow> = inner
            .properties
            .iter()
            .filter(|row| row.variant() == variant)
            .cloned()
            .collect();
        Ok(Box::new(VecCursor::new(rows)))
    }

    fn sample_types(&self) -> ListResult<Vec<SampleType>> {
        Ok(self.inner.read().sample_types.values().cloned().collect())
    }

    fn sample_type_by_code(&self, code: &Code) -> ListResult<Option<SampleType>> {
        Ok(self
            .inner
            .read()
            .sample_types
            .values()
            .find(|t| &t.code == code)
            .cloned())
    }

    fn spaces(&self) -> ListResult<Vec<Space>> {
        Ok(self.inner.read().spaces.values().cloned().collect())
    }

    fn property_types(&self) -> ListResult<Vec<PropertyType>> {
        Ok(self.inner.read().property_types.values().cloned().collect())
    }

    fn experiment(&self, id: ExperimentId) -> ListResult<Option<Experiment>> {
        Ok(self.inner.read().experiments.get(&id).cloned())
    }

    fn person(&self, id: PersonId) -> ListResult<Option<Person>> {
        Ok(self.inner.read().persons.get(&id).cloned())
    }

    fn vocabulary_term(&self, id: VocabularyTermId) -> ListResult<Option<VocabularyTerm>> {
        Ok(self.inner.read().terms.get(&id).cloned())
    }

    fn material(&self, id: MaterialId) -> ListResult<Option<MaterialRef>> {
        Ok(self.inner.read().materials.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use samplist_core::cursor::RowCursor;
    use samplist_core::property::PropertyPayload;
    use samplist_core::sample::Scope;
    use samplist_core::store::ScopeFilter;
    use samplist_core::types::InstanceId;

    fn row(id: u64, code: &str, scope: Scope) -> SampleRow {
        SampleRow {
            id: SampleId::new(id),
            perm_id: PermId::new(format!("perm-{id}")),
            code: Code::new(code),
            type_id: SampleTypeId::new(1),
            instance_id: InstanceId::new(1),
            scope,
            experiment_id: None,
            container_id: None,
            registrator_id: PersonId::new(1),
            registered_at: Utc::now(),
            invalidated: false,
        }
    }

    fn ids(raw: &[u64]) -> IdSet {
        raw.iter().copied().map(SampleId::new).collect()
    }

    #[test]
    fn get_by_id_code_and_perm_id_agree() {
        let store = MemoryStore::new();
        store.add_sample(row(1, "S1", Scope::Shared));

        let by_id = store.get_by_id(SampleId::new(1)).unwrap().unwrap();
        let by_code = store.get_by_code(&Code::new("S1")).unwrap().unwrap();
        let by_perm = store.get_by_perm_id(&PermId::new("perm-1")).unwrap().unwrap();
        assert_eq!(by_id, by_code);
        assert_eq!(by_id, by_perm);
    }

    #[test]
    fn missing_lookups_return_none() {
        let store = MemoryStore::new();
        assert!(store.get_by_id(SampleId::new(9)).unwrap().is_none());
        assert!(store.get_by_code(&Code::new("NOPE")).unwrap().is_none());
        assert!(store
            .get_by_perm_id(&PermId::new("nope"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn remove_sample_unindexes_code_and_perm_id() {
        let store = MemoryStore::new();
        store.add_sample(row(1, "S1", Scope::Shared));
        store.remove_sample(SampleId::new(1));
        assert_eq!(store.count_all().unwrap(), 0);
        assert!(store.get_by_code(&Code::new("S1")).unwrap().is_none());
    }

    #[test]
    fn get_by_ids_skips_missing_rows() {
        let store = MemoryStore::new();
        store.add_sample(row(1, "S1", Scope::Shared));
        store.add_sample(row(3, "S3", Scope::Shared));

        let rows = store.get_by_ids(&ids(&[1, 2, 3])).unwrap().collect_rows().unwrap();
        let got: Vec<u64> = rows.iter().map(|r| r.id.raw()).collect();
        assert_eq!(got, vec![1, 3]);
    }

    #[test]
    fn stream_filtered_pushes_scope_down() {
        let store = MemoryStore::new();
        store.add_sample(row(1, "S1", Scope::Shared));
        store.add_sample(row(2, "S2", Scope::Space(SpaceId::new(1))));
        store.add_sample(row(3, "S3", Scope::Space(SpaceId::new(2))));

        let filter = SampleFilter {
            scope: ScopeFilter::Space(SpaceId::new(1)),
            ..Default::default()
        };
        let rows = store.stream_filtered(&filter).unwrap().collect_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, SampleId::new(2));
    }

    #[test]
    fn cursor_snapshots_at_call_time() {
        let store = MemoryStore::new();
        store.add_sample(row(1, "S1", Scope::Shared));
        let mut cursor = store.stream_all().unwrap();
        store.add_sample(row(2, "S2", Scope::Shared));

        // The open cursor sees the state at call time.
        let mut seen = 0;
        while cursor.next_row().unwrap().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 1);
        assert_eq!(store.count_all().unwrap(), 2);
    }

    #[test]
    fn edges_filter_by_type_and_direction() {
        let store = MemoryStore::new();
        let lineage = RelationshipTypeId::new(1);
        let other = RelationshipTypeId::new(2);
        store.add_edge(RelationshipEdge {
            relationship: lineage,
            parent: SampleId::new(10),
            child: SampleId::new(1),
        });
        store.add_edge(RelationshipEdge {
            relationship: other,
            parent: SampleId::new(11),
            child: SampleId::new(1),
        });

        let toward_parents = store
            .relationship_edges(lineage, EdgeDirection::TowardParents, &ids(&[1]))
            .unwrap();
        assert_eq!(toward_parents.len(), 1);
        assert_eq!(toward_parents[0].parent, SampleId::new(10));

        let toward_children = store
            .relationship_edges(lineage, EdgeDirection::TowardChildren, &ids(&[10]))
            .unwrap();
        assert_eq!(toward_children.len(), 1);
        assert_eq!(toward_children[0].child, SampleId::new(1));

        // No lineage edges from the child's perspective as a parent.
        assert!(store
            .relationship_edges(lineage, EdgeDirection::TowardChildren, &ids(&[1]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn property_rows_filter_by_variant_and_id_set() {
        let store = MemoryStore::new();
        store.add_property(PropertyRow {
            sample_id: SampleId::new(1),
            property_type_id: PropertyTypeId::new(1),
            payload: PropertyPayload::Generic("a".into()),
        });
        store.add_property(PropertyRow {
            sample_id: SampleId::new(1),
            property_type_id: PropertyTypeId::new(2),
            payload: PropertyPayload::Term(VocabularyTermId::new(5)),
        });
        store.add_property(PropertyRow {
            sample_id: SampleId::new(2),
            property_type_id: PropertyTypeId::new(1),
            payload: PropertyPayload::Generic("b".into()),
        });

        let generic = store
            .property_rows(PropertyVariant::Generic, &ids(&[1]))
            .unwrap()
            .collect_rows()
            .unwrap();
        assert_eq!(generic.len(), 1);

        let all_terms = store
            .stream_all_properties(PropertyVariant::Vocabulary)
            .unwrap()
            .collect_rows()
            .unwrap();
        assert_eq!(all_terms.len(), 1);
        assert_eq!(all_terms[0].sample_id, SampleId::new(1));
    }

    #[test]
    fn sample_type_lookup_by_code() {
        let store = MemoryStore::new();
        store.add_sample_type(SampleType {
            id: SampleTypeId::new(1),
            code: Code::new("WELL"),
            generated_from_depth: 1,
            container_depth: 1,
            listable: true,
        });
        assert!(store
            .sample_type_by_code(&Code::new("WELL"))
            .unwrap()
            .is_some());
        assert!(store
            .sample_type_by_code(&Code::new("PLATE"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn capability_flag_is_reported() {
        assert!(MemoryStore::new().supports_set_predicates());
        assert!(!MemoryStore::with_set_predicates(false).supports_set_predicates());
    }
}
