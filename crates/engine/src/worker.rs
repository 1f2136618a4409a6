//! The listing worker and its facade
//!
//! [`SampleLister`] is the long-lived entry point: it owns the strategy
//! chooser and the property type catalog and spins up one [`ListingWorker`]
//! per call. The worker drives a fixed phase sequence:
//!
//! Init -> PrimaryFetch -> DependencyDiscovery -> Enrichment -> Done
//!
//! Init loads the type and space catalogs. PrimaryFetch materializes the
//! samples matching the selector. DependencyDiscovery pulls in parents (up
//! to each type's generated-from depth) and containers (one level, code
//! resolution only) in batched rounds. Enrichment attaches property values.
//! The Done transition resolves the relationship references and recomposes
//! the display codes of contained samples.

use crate::config::ListerConfig;
use crate::enrich::{PropertyEnricher, PropertyTypeCatalog};
use crate::graph::ResultGraph;
use crate::strategy::StrategyChooser;
use rustc_hash::{FxHashMap, FxHashSet};
use samplist_core::criteria::{ListingCriteria, PrimarySelector, PropertyMatch};
use samplist_core::cursor::RowCursor;
use samplist_core::property::{PropertyPayload, PropertyVariant};
use samplist_core::sample::{Experiment, Person, Sample, SampleRow, SampleType, Space};
use samplist_core::store::{EdgeDirection, SampleFilter, SampleStore, ScopeFilter};
use samplist_core::types::{Code, ExperimentId, IdSet, PersonId, SampleId, SampleTypeId, SpaceId};
use samplist_core::ListResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

// ============================================================================
// Facade
// ============================================================================

/// Long-lived sample listing service.
///
/// Cheap to share behind an `Arc`; independent listing calls may run
/// concurrently. The only cross-call state is the cached table count and
/// the property type catalog.
pub struct SampleLister {
    store: Arc<dyn SampleStore>,
    config: ListerConfig,
    chooser: Arc<StrategyChooser>,
    enricher: PropertyEnricher,
}

impl SampleLister {
    /// Lister over the given store.
    pub fn new(store: Arc<dyn SampleStore>, config: ListerConfig) -> Self {
        let chooser = Arc::new(StrategyChooser::new(Arc::clone(&store), &config));
        let catalog = Arc::new(PropertyTypeCatalog::new());
        let enricher =
            PropertyEnricher::new(Arc::clone(&store), Arc::clone(&chooser), catalog);
        SampleLister {
            store,
            config,
            chooser,
            enricher,
        }
    }

    /// Run one listing call.
    ///
    /// # Errors
    ///
    /// Returns an invalid-criteria error for a malformed selector payload,
    /// or a backend error if any store call fails. On error no partial
    /// result is returned.
    pub fn list(&self, criteria: &ListingCriteria) -> ListResult<ResultGraph> {
        criteria.validate()?;
        ListingWorker::new(self, criteria).run()
    }

    /// The strategy chooser shared by all calls of this lister.
    pub fn strategy_chooser(&self) -> &StrategyChooser {
        &self.chooser
    }
}

// ============================================================================
// Worker
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    PrimaryFetch,
    DependencyDiscovery,
    Enrichment,
    Done,
}

/// Per-call listing state machine.
struct ListingWorker<'a> {
    store: &'a dyn SampleStore,
    config: &'a ListerConfig,
    chooser: &'a StrategyChooser,
    enricher: &'a PropertyEnricher,
    criteria: &'a ListingCriteria,
    graph: ResultGraph,
    types_by_id: FxHashMap<SampleTypeId, Arc<SampleType>>,
    spaces_by_id: FxHashMap<SpaceId, Arc<Space>>,
    spaces_by_code: FxHashMap<Code, SpaceId>,
    // Per-call descriptor caches, shared across the samples of this call.
    experiments: FxHashMap<ExperimentId, Arc<Experiment>>,
    persons: FxHashMap<PersonId, Arc<Person>>,
    /// Single-type mode: depth limits and the type restriction come from
    /// this type alone.
    single_type: Option<Arc<SampleType>>,
    /// Broad listings (by space) show listable types only.
    listable_only: bool,
    /// The selector named an unknown space or type code.
    empty: bool,
    /// Remaining parent generations per fetched sample.
    budget: FxHashMap<SampleId, u32>,
    /// Fetched samples awaiting a parent-edge query.
    pending_parent_lookup: IdSet,
    /// Scheduled ids not yet fetched.
    pending_fetch: IdSet,
    /// Budget a scheduled id will carry once fetched.
    pending_budget: FxHashMap<SampleId, u32>,
    /// Scheduled for container code resolution only, no further recursion.
    container_only: FxHashSet<SampleId>,
    /// Child to generated-from parent, as discovered from edges.
    parent_links: FxHashMap<SampleId, SampleId>,
}

impl<'a> ListingWorker<'a> {
    fn new(lister: &'a SampleLister, criteria: &'a ListingCriteria) -> Self {
        ListingWorker {
            store: lister.store.as_ref(),
            config: &lister.config,
            chooser: &lister.chooser,
            enricher: &lister.enricher,
            criteria,
            graph: ResultGraph::new(),
            types_by_id: FxHashMap::default(),
            spaces_by_id: FxHashMap::default(),
            spaces_by_code: FxHashMap::default(),
            experiments: FxHashMap::default(),
            persons: FxHashMap::default(),
            single_type: None,
            listable_only: matches!(criteria.selector, PrimarySelector::OfSpace(_)),
            empty: false,
            budget: FxHashMap::default(),
            pending_parent_lookup: IdSet::new(),
            pending_fetch: IdSet::new(),
            pending_budget: FxHashMap::default(),
            container_only: FxHashSet::default(),
            parent_links: FxHashMap::default(),
        }
    }

    fn run(mut self) -> ListResult<ResultGraph> {
        let mut phase = Phase::Init;
        loop {
            let started = Instant::now();
            let next = match phase {
                Phase::Init => {
                    self.init()?;
                    Phase::PrimaryFetch
                }
                Phase::PrimaryFetch => {
                    self.primary_fetch()?;
                    Phase::DependencyDiscovery
                }
                Phase::DependencyDiscovery => {
                    self.discover_dependencies()?;
                    Phase::Enrichment
                }
                Phase::Enrichment => {
                    self.enrich_properties()?;
                    Phase::Done
                }
                Phase::Done => break,
            };
            debug!(
                ?phase,
                elapsed_ms = started.elapsed().as_millis() as u64,
                samples = self.graph.len(),
                "listing phase complete"
            );
            phase = next;
        }
        self.resolve_links();
        Ok(self.graph)
    }

    // ------------------------------------------------------------------
    // Init
    // ------------------------------------------------------------------

    fn init(&mut self) -> ListResult<()> {
        for sample_type in self.store.sample_types()? {
            self.types_by_id
                .insert(sample_type.id, Arc::new(sample_type));
        }
        for space in self.store.spaces()? {
            self.spaces_by_code.insert(space.code.clone(), space.id);
            self.spaces_by_id.insert(space.id, Arc::new(space));
        }
        if let Some(type_code) = &self.criteria.single_type {
            match self.types_by_id.values().find(|t| &t.code == type_code) {
                Some(sample_type) => self.single_type = Some(Arc::clone(sample_type)),
                // Unknown type code: nothing can match.
                None => self.empty = true,
            }
        }
        Ok(())
    }

    /// Parent-generation depth in effect for a sample of this type.
    fn generated_from_depth(&self, sample_type: &SampleType) -> u32 {
        self.single_type
            .as_ref()
            .map_or(sample_type.generated_from_depth, |t| {
                t.generated_from_depth
            })
    }

    /// Container depth in effect for a sample of this type.
    fn container_depth(&self, sample_type: &SampleType) -> u32 {
        self.single_type
            .as_ref()
            .map_or(sample_type.container_depth, |t| t.container_depth)
    }

    /// Scope restriction the backend can apply itself. A space-only
    /// restriction without a named space cannot be pushed down; it is
    /// enforced on admission instead.
    fn scope_pushdown(&self) -> ScopeFilter {
        if self.criteria.include_shared && !self.criteria.include_space {
            ScopeFilter::Shared
        } else {
            ScopeFilter::Any
        }
    }

    // ------------------------------------------------------------------
    // PrimaryFetch
    // ------------------------------------------------------------------

    fn primary_fetch(&mut self) -> ListResult<()> {
        if self.empty {
            return Ok(());
        }
        let criteria = self.criteria;
        match &criteria.selector {
            PrimarySelector::Ids(ids) => {
                let wanted: IdSet = ids.iter().copied().collect();
                let query = self.chooser.set_query(wanted.len(), Instant::now())?;
                let mut rows = query.fetch_samples(&wanted)?;
                while let Some(row) = rows.next_row()? {
                    self.admit_primary(row)?;
                }
            }
            PrimarySelector::Codes(codes) => {
                for code in codes {
                    // Missing codes are skipped, not errors.
                    if let Some(row) = self.store.get_by_code(code)? {
                        self.admit_primary(row)?;
                    }
                }
            }
            PrimarySelector::PermIds(perm_ids) => {
                for perm_id in perm_ids {
                    if let Some(row) = self.store.get_by_perm_id(perm_id)? {
                        self.admit_primary(row)?;
                    }
                }
            }
            PrimarySelector::OfExperiment(experiment_id) => {
                let filter = SampleFilter {
                    scope: self.scope_pushdown(),
                    experiment_id: Some(*experiment_id),
                    type_id: self.single_type.as_ref().map(|t| t.id),
                    ..Default::default()
                };
                self.admit_filtered(&filter)?;
            }
            PrimarySelector::ContainedBy(container_id) => {
                let filter = SampleFilter {
                    scope: self.scope_pushdown(),
                    container_id: Some(*container_id),
                    type_id: self.single_type.as_ref().map(|t| t.id),
                    ..Default::default()
                };
                self.admit_filtered(&filter)?;
            }
            PrimarySelector::ChildrenOf(parent_id) => {
                let parents: IdSet = std::iter::once(*parent_id).collect();
                let edges = self.store.relationship_edges(
                    self.config.parent_relationship,
                    EdgeDirection::TowardChildren,
                    &parents,
                )?;
                let children: IdSet = edges.iter().map(|edge| edge.child).collect();
                if !children.is_empty() {
                    let query = self.chooser.set_query(children.len(), Instant::now())?;
                    let mut rows = query.fetch_samples(&children)?;
                    while let Some(row) = rows.next_row()? {
                        self.admit_primary(row)?;
                    }
                }
            }
            PrimarySelector::OfSpace(space_code) => {
                // Unknown space code: empty result.
                let Some(space_id) = self.spaces_by_code.get(space_code).copied() else {
                    return Ok(());
                };
                let filter = SampleFilter {
                    scope: ScopeFilter::Space(space_id),
                    type_id: self.single_type.as_ref().map(|t| t.id),
                    ..Default::default()
                };
                self.admit_filtered(&filter)?;
            }
            PrimarySelector::OfType {
                type_code,
                property,
            } => {
                let Some(sample_type) = self
                    .types_by_id
                    .values()
                    .find(|t| &t.code == type_code)
                    .cloned()
                else {
                    return Ok(());
                };
                let filter = SampleFilter {
                    scope: self.scope_pushdown(),
                    type_id: Some(sample_type.id),
                    ..Default::default()
                };
                let mut rows = self.store.stream_filtered(&filter)?;
                let mut candidates = Vec::new();
                while let Some(row) = rows.next_row()? {
                    candidates.push(row);
                }
                if let Some(wanted) = property {
                    let matching = self.match_property(&candidates, wanted)?;
                    candidates.retain(|row| matching.contains(&row.id));
                }
                for row in candidates {
                    self.admit_primary(row)?;
                }
            }
        }
        debug!(primaries = self.graph.primary_count(), "primary fetch done");
        Ok(())
    }

    fn admit_filtered(&mut self, filter: &SampleFilter) -> ListResult<()> {
        let mut rows = self.store.stream_filtered(filter)?;
        while let Some(row) = rows.next_row()? {
            self.admit_primary(row)?;
        }
        Ok(())
    }

    /// Sample ids among `candidates` carrying the wanted property value.
    fn match_property(
        &self,
        candidates: &[SampleRow],
        wanted: &PropertyMatch,
    ) -> ListResult<FxHashSet<SampleId>> {
        let mut matching = FxHashSet::default();
        let Some(property_type_id) = self
            .store
            .property_types()?
            .iter()
            .find(|t| t.code == wanted.property_code)
            .map(|t| t.id)
        else {
            // Unknown property code matches nothing.
            return Ok(matching);
        };
        let ids: IdSet = candidates.iter().map(|row| row.id).collect();
        if ids.is_empty() {
            return Ok(matching);
        }
        for variant in PropertyVariant::ALL {
            let query = self.chooser.set_query(ids.len(), Instant::now())?;
            let mut rows = query.fetch_properties(variant, &ids)?;
            while let Some(row) = rows.next_row()? {
                if row.property_type_id != property_type_id {
                    continue;
                }
                let value_matches = match &row.payload {
                    PropertyPayload::Generic(value) => value == &wanted.value,
                    PropertyPayload::Term(term_id) => self
                        .store
                        .vocabulary_term(*term_id)?
                        .map_or(false, |term| term.code.as_str() == wanted.value),
                    PropertyPayload::Material(material_id) => self
                        .store
                        .material(*material_id)?
                        .map_or(false, |material| material.code.as_str() == wanted.value),
                };
                if value_matches {
                    matching.insert(row.sample_id);
                }
            }
        }
        Ok(matching)
    }

    /// Admit one row as a primary sample, applying the scope, experiment,
    /// type and instance filters. Filters apply to primaries only.
    fn admit_primary(&mut self, row: SampleRow) -> ListResult<()> {
        let criteria = self.criteria;
        if row.instance_id != self.config.home_instance {
            return Ok(());
        }
        if row.scope.is_shared() {
            if !criteria.include_shared {
                return Ok(());
            }
        } else if !criteria.include_space {
            return Ok(());
        }
        if criteria.require_experiment && row.experiment_id.is_none() {
            return Ok(());
        }
        if let Some(single) = &self.single_type {
            if row.type_id != single.id {
                return Ok(());
            }
        }
        let Some(sample_type) = self.types_by_id.get(&row.type_id).cloned() else {
            // Dangling type reference: treat like a concurrently deleted row.
            return Ok(());
        };
        if self.listable_only && !sample_type.listable {
            return Ok(());
        }
        if self.graph.contains(row.id) {
            return Ok(());
        }

        let mut sample = Sample::from_row(&row, Arc::clone(&sample_type), true);
        sample.space = row
            .scope
            .space_id()
            .and_then(|space_id| self.spaces_by_id.get(&space_id).cloned());
        if let Some(experiment_id) = row.experiment_id {
            sample.experiment = self.get_or_load_experiment(experiment_id)?;
        }
        sample.registrator = self.get_or_load_person(row.registrator_id)?;
        self.schedule_dependencies(&row, &sample_type);
        self.graph.insert_primary(sample);
        Ok(())
    }

    fn get_or_load_experiment(
        &mut self,
        id: ExperimentId,
    ) -> ListResult<Option<Arc<Experiment>>> {
        if let Some(experiment) = self.experiments.get(&id) {
            return Ok(Some(Arc::clone(experiment)));
        }
        match self.store.experiment(id)? {
            Some(experiment) => {
                let experiment = Arc::new(experiment);
                self.experiments.insert(id, Arc::clone(&experiment));
                Ok(Some(experiment))
            }
            None => Ok(None),
        }
    }

    fn get_or_load_person(&mut self, id: PersonId) -> ListResult<Option<Arc<Person>>> {
        if let Some(person) = self.persons.get(&id) {
            return Ok(Some(Arc::clone(person)));
        }
        match self.store.person(id)? {
            Some(person) => {
                let person = Arc::new(person);
                self.persons.insert(id, Arc::clone(&person));
                Ok(Some(person))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // DependencyDiscovery
    // ------------------------------------------------------------------

    /// Record what a newly admitted sample still needs: a parent-edge
    /// lookup when its depth budget allows, and its container (code
    /// resolution only, never recursed).
    fn schedule_dependencies(&mut self, row: &SampleRow, sample_type: &SampleType) {
        let parent_budget = self.generated_from_depth(sample_type);
        if parent_budget > 0 {
            self.budget.insert(row.id, parent_budget);
            self.pending_parent_lookup.insert(row.id);
        }
        if self.container_depth(sample_type) > 0 {
            if let Some(container_id) = row.container_id {
                self.schedule_fetch(container_id, 0, true);
            }
        }
    }

    /// Schedule an id for a dependent fetch. Ids already in the graph are
    /// never re-scheduled, which also breaks relationship cycles. On a
    /// repeated scheduling the larger budget wins, and a relationship
    /// scheduling upgrades a container-only one.
    fn schedule_fetch(&mut self, id: SampleId, budget: u32, container_only: bool) {
        if self.graph.contains(id) {
            return;
        }
        if self.pending_fetch.insert(id) {
            if budget > 0 {
                self.pending_budget.insert(id, budget);
            }
            if container_only {
                self.container_only.insert(id);
            }
            return;
        }
        if budget > 0 {
            let slot = self.pending_budget.entry(id).or_insert(0);
            if budget > *slot {
                *slot = budget;
            }
        }
        if !container_only {
            self.container_only.remove(&id);
        }
    }

    /// Pull in dependent samples in batched rounds until nothing is
    /// pending: resolve parent edges for all samples that still have
    /// budget, then fetch every newly discovered id in one batch.
    fn discover_dependencies(&mut self) -> ListResult<()> {
        loop {
            if !self.pending_parent_lookup.is_empty() {
                let children = std::mem::take(&mut self.pending_parent_lookup);
                let edges = self.store.relationship_edges(
                    self.config.parent_relationship,
                    EdgeDirection::TowardParents,
                    &children,
                )?;
                for edge in edges {
                    // One generated-from parent per sample; the first edge
                    // wins if the data carries more.
                    if self.parent_links.contains_key(&edge.child) {
                        continue;
                    }
                    self.parent_links.insert(edge.child, edge.parent);
                    let remaining = self.budget.get(&edge.child).copied().unwrap_or(0);
                    self.schedule_fetch(edge.parent, remaining.saturating_sub(1), false);
                }
            }
            if self.pending_fetch.is_empty() {
                break;
            }
            let batch = std::mem::take(&mut self.pending_fetch);
            debug!(batch = batch.len(), "fetching dependent samples");
            let query = self.chooser.set_query(batch.len(), Instant::now())?;
            let mut rows = query.fetch_samples(&batch)?;
            while let Some(row) = rows.next_row()? {
                self.admit_dependent(row);
            }
            // Ids the store no longer knows never come back; drop their
            // leftover bookkeeping so the loop can terminate.
            self.pending_budget
                .retain(|id, _| self.pending_fetch.contains(id));
            self.container_only
                .retain(|id| self.pending_fetch.contains(id));
        }
        debug!(
            dependents = self.graph.dependent_count(),
            "dependency discovery done"
        );
        Ok(())
    }

    /// Admit one row as a dependent sample. Scope and experiment filters do
    /// not apply to dependents; the instance restriction still does.
    fn admit_dependent(&mut self, row: SampleRow) {
        let budget = self.pending_budget.remove(&row.id).unwrap_or(0);
        let container_only = self.container_only.remove(&row.id);
        if self.graph.contains(row.id) || row.instance_id != self.config.home_instance {
            return;
        }
        let Some(sample_type) = self.types_by_id.get(&row.type_id).cloned() else {
            return;
        };
        let sample = Sample::from_row(&row, Arc::clone(&sample_type), false);
        if !container_only {
            if budget > 0 {
                self.budget.insert(row.id, budget);
                self.pending_parent_lookup.insert(row.id);
            }
            if self.container_depth(&sample_type) > 0 {
                if let Some(container_id) = row.container_id {
                    self.schedule_fetch(container_id, 0, true);
                }
            }
        }
        self.graph.insert_dependent(sample);
    }

    // ------------------------------------------------------------------
    // Enrichment
    // ------------------------------------------------------------------

    fn enrich_properties(&mut self) -> ListResult<()> {
        let ids = if self.criteria.enrich_dependents {
            self.graph.all_ids()
        } else {
            self.graph.primary_ids()
        };
        self.enricher.enrich(&ids, &mut self.graph)
    }

    // ------------------------------------------------------------------
    // Done
    // ------------------------------------------------------------------

    /// Resolve parent and container references against the graph and
    /// recompose the display code of contained samples. References whose
    /// target is not in the graph (out of depth, or gone from the store)
    /// stay unresolved.
    fn resolve_links(&mut self) {
        let mut resolved_parents = 0usize;
        let links: Vec<(SampleId, SampleId)> =
            self.parent_links.iter().map(|(c, p)| (*c, *p)).collect();
        for (child, parent) in links {
            if !self.graph.contains(parent) {
                continue;
            }
            if let Some(sample) = self.graph.get_mut(child) {
                sample.generated_from = Some(parent);
                resolved_parents += 1;
            }
        }

        let updates: Vec<(SampleId, SampleId, Code)> = self
            .graph
            .iter()
            .filter_map(|sample| {
                let container_id = sample.container_id?;
                let container = self.graph.get(container_id)?;
                Some((
                    sample.id,
                    container_id,
                    Code::composite(&container.code, &sample.sub_code),
                ))
            })
            .collect();
        let resolved_containers = updates.len();
        for (id, container_id, code) in updates {
            if let Some(sample) = self.graph.get_mut(id) {
                sample.container = Some(container_id);
                sample.code = code;
            }
        }
        debug!(
            parents = resolved_parents,
            containers = resolved_containers,
            "resolved relationship links"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use samplist_core::sample::Scope;
    use samplist_core::store::RelationshipEdge;
    use samplist_core::types::{InstanceId, PermId, RelationshipTypeId};
    use samplist_core::ListError;
    use samplist_storage::MemoryStore;

    const LINEAGE: RelationshipTypeId = RelationshipTypeId::new(1);

    fn row(id: u64, code: &str, type_id: u64, scope: Scope) -> SampleRow {
        SampleRow {
            id: SampleId::new(id),
            perm_id: PermId::new(format!("perm-{id}")),
            code: Code::new(code),
            type_id: SampleTypeId::new(type_id),
            instance_id: InstanceId::new(1),
            scope,
            experiment_id: None,
            container_id: None,
            registrator_id: PersonId::new(1),
            registered_at: Utc::now(),
            invalidated: false,
        }
    }

    fn sample_type(id: u64, code: &str, gen: u32, cont: u32, listable: bool) -> SampleType {
        SampleType {
            id: SampleTypeId::new(id),
            code: Code::new(code),
            generated_from_depth: gen,
            container_depth: cont,
            listable,
        }
    }

    /// A small lab: a plate in LAB1 holding a well, a cell lineage of
    /// depth three, and one person and experiment.
    fn lab() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_sample_type(sample_type(1, "PLATE", 0, 0, true));
        store.add_sample_type(sample_type(2, "WELL", 0, 1, true));
        store.add_sample_type(sample_type(3, "CELL", 2, 0, true));
        store.add_sample_type(sample_type(4, "HIDDEN", 0, 0, false));
        store.add_space(Space {
            id: SpaceId::new(1),
            code: Code::new("LAB1"),
            instance_id: InstanceId::new(1),
        });
        store.add_person(Person {
            id: PersonId::new(1),
            user_id: "alice".into(),
            email: None,
            first_name: None,
            last_name: None,
        });
        store.add_experiment(Experiment {
            id: ExperimentId::new(7),
            code: Code::new("EXP1"),
            project_code: Code::new("PROJ"),
            space_code: Code::new("LAB1"),
            type_code: Code::new("SIRNA"),
        });

        let lab1 = Scope::Space(SpaceId::new(1));
        store.add_sample(row(10, "PLATE1", 1, lab1));
        let mut well = row(11, "A01", 2, lab1);
        well.container_id = Some(SampleId::new(10));
        well.experiment_id = Some(ExperimentId::new(7));
        store.add_sample(well);

        // Cell lineage: 20 <- 21 <- 22 <- 23 (generated-from depth 2 on
        // CELL, so 23 stays out of reach).
        for (id, code) in [(20, "C2"), (21, "C1"), (22, "C0"), (23, "CROOT")] {
            store.add_sample(row(id, code, 3, lab1));
        }
        for (parent, child) in [(21, 20), (22, 21), (23, 22)] {
            store.add_edge(RelationshipEdge {
                relationship: LINEAGE,
                parent: SampleId::new(parent),
                child: SampleId::new(child),
            });
        }
        store
    }

    fn lister(store: Arc<MemoryStore>) -> SampleLister {
        SampleLister::new(store as Arc<dyn SampleStore>, ListerConfig::default())
    }

    fn ids(raw: &[u64]) -> Vec<SampleId> {
        raw.iter().copied().map(SampleId::new).collect()
    }

    #[test]
    fn primaries_carry_resolved_descriptors() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_ids(ids(&[11])))
            .unwrap();
        let well = graph.get(SampleId::new(11)).unwrap();
        assert!(well.is_primary);
        assert_eq!(well.sample_type.code, Code::new("WELL"));
        assert_eq!(well.space.as_ref().unwrap().code, Code::new("LAB1"));
        assert_eq!(well.experiment.as_ref().unwrap().code, Code::new("EXP1"));
        assert_eq!(well.registrator.as_ref().unwrap().user_id, "alice");
    }

    #[test]
    fn container_is_pulled_in_and_code_recomposed() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_ids(ids(&[11])))
            .unwrap();
        assert_eq!(graph.len(), 2);

        let well = graph.get(SampleId::new(11)).unwrap();
        assert_eq!(well.container, Some(SampleId::new(10)));
        assert_eq!(well.code, Code::new("PLATE1:A01"));
        assert_eq!(well.sub_code, "A01");

        let plate = graph.get(SampleId::new(10)).unwrap();
        assert!(!plate.is_primary);
        // Containers are code-only dependents: their own relationships are
        // not chased.
        assert_eq!(plate.generated_from, None);
    }

    #[test]
    fn parent_chain_stops_at_the_type_depth() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_ids(ids(&[20])))
            .unwrap();
        // 20 plus two generations; 23 is beyond the depth of CELL.
        assert_eq!(graph.len(), 3);
        assert_eq!(
            graph.get(SampleId::new(20)).unwrap().generated_from,
            Some(SampleId::new(21))
        );
        assert_eq!(
            graph.get(SampleId::new(21)).unwrap().generated_from,
            Some(SampleId::new(22))
        );
        assert_eq!(graph.get(SampleId::new(22)).unwrap().generated_from, None);
        assert!(!graph.contains(SampleId::new(23)));
    }

    #[test]
    fn cyclic_lineage_terminates_and_resolves_both_ways() {
        let store = lab();
        store.add_sample(row(50, "CY1", 3, Scope::Shared));
        store.add_sample(row(51, "CY2", 3, Scope::Shared));
        for (parent, child) in [(51, 50), (50, 51)] {
            store.add_edge(RelationshipEdge {
                relationship: LINEAGE,
                parent: SampleId::new(parent),
                child: SampleId::new(child),
            });
        }

        let graph = lister(store)
            .list(&ListingCriteria::for_ids(ids(&[50])))
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.get(SampleId::new(50)).unwrap().generated_from,
            Some(SampleId::new(51))
        );
        assert_eq!(
            graph.get(SampleId::new(51)).unwrap().generated_from,
            Some(SampleId::new(50))
        );
    }

    #[test]
    fn dangling_parent_edge_stays_unresolved() {
        let store = lab();
        store.remove_sample(SampleId::new(21));
        let graph = lister(store)
            .list(&ListingCriteria::for_ids(ids(&[20])))
            .unwrap();
        // The parent row is gone: the listing still succeeds, the
        // reference stays unresolved and the chain is cut.
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get(SampleId::new(20)).unwrap().generated_from, None);
    }

    #[test]
    fn scope_flags_filter_primaries_not_dependents() {
        let store = lab();
        store.add_sample(row(30, "SHARED1", 1, Scope::Shared));
        let lister = lister(store);

        let spaces_off = lister
            .list(&ListingCriteria::for_ids(ids(&[10, 30])).include_space(false))
            .unwrap();
        assert_eq!(spaces_off.primary_ids().len(), 1);
        assert!(spaces_off.contains(SampleId::new(30)));

        // The well's container is space-scoped but comes in anyway: the
        // scope filter applies to selector matches only.
        let graph = lister
            .list(&ListingCriteria::for_ids(ids(&[11, 30])).include_shared(false))
            .unwrap();
        assert!(graph.get(SampleId::new(11)).unwrap().is_primary);
        assert!(!graph.contains(SampleId::new(30)));
        assert!(graph.contains(SampleId::new(10)));
    }

    #[test]
    fn require_experiment_excludes_unassigned() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_ids(ids(&[10, 11])).require_experiment(true))
            .unwrap();
        assert_eq!(graph.primary_ids().len(), 1);
        assert!(graph.contains(SampleId::new(11)));
    }

    #[test]
    fn foreign_instance_rows_are_excluded() {
        let store = lab();
        let mut foreign = row(40, "REMOTE1", 1, Scope::Shared);
        foreign.instance_id = InstanceId::new(2);
        store.add_sample(foreign);
        let graph = lister(store)
            .list(&ListingCriteria::for_ids(ids(&[10, 40])))
            .unwrap();
        assert!(!graph.contains(SampleId::new(40)));
        assert!(graph.contains(SampleId::new(10)));
    }

    #[test]
    fn space_listing_shows_listable_types_only() {
        let store = lab();
        store.add_sample(row(41, "GHOST1", 4, Scope::Space(SpaceId::new(1))));
        let graph = lister(store)
            .list(&ListingCriteria::for_space(Code::new("LAB1")))
            .unwrap();
        assert!(!graph.contains(SampleId::new(41)));
        assert!(graph.contains(SampleId::new(10)));
    }

    #[test]
    fn unknown_space_and_type_codes_yield_empty_results() {
        let lister = lister(lab());
        assert!(lister
            .list(&ListingCriteria::for_space(Code::new("NOPE")))
            .unwrap()
            .is_empty());
        assert!(lister
            .list(&ListingCriteria::for_type(Code::new("NOPE"), None))
            .unwrap()
            .is_empty());
        assert!(lister
            .list(&ListingCriteria::for_ids(ids(&[10])).single_type(Code::new("NOPE")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn single_type_mode_restricts_primaries() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_ids(ids(&[10, 11])).single_type(Code::new("PLATE")))
            .unwrap();
        assert_eq!(graph.primary_ids().len(), 1);
        assert!(graph.contains(SampleId::new(10)));
    }

    #[test]
    fn children_of_selector_uses_lineage_edges() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_parent(SampleId::new(21)))
            .unwrap();
        let primaries: Vec<u64> = graph.primaries().map(|s| s.id.raw()).collect();
        assert_eq!(primaries, vec![20]);
    }

    #[test]
    fn missing_codes_are_skipped_silently() {
        let graph = lister(lab())
            .list(&ListingCriteria::for_codes([
                Code::new("PLATE1"),
                Code::new("NO-SUCH-CODE"),
            ]))
            .unwrap();
        assert_eq!(graph.primary_ids().len(), 1);
    }

    #[test]
    fn invalid_criteria_is_rejected_before_any_fetch() {
        let err = lister(lab())
            .list(&ListingCriteria::for_ids([]))
            .unwrap_err();
        assert!(matches!(err, ListError::InvalidCriteria { .. }));
    }
}
