//! Backend-access contract
//!
//! [`SampleStore`] is the narrow batch-query interface the listing engine
//! consumes. A SQL backend implements each method with one statement; the
//! in-memory reference backend lives in `samplist-storage`.
//!
//! The engine never retries a failed call: any error aborts the listing and
//! reaches the caller as a backend-communication error.

use crate::cursor::BoxedCursor;
use crate::error::ListResult;
use crate::property::{MaterialRef, PropertyRow, PropertyType, PropertyVariant, VocabularyTerm};
use crate::sample::{Experiment, Person, SampleRow, SampleType, Space};
use crate::types::{
    Code, ExperimentId, IdSet, MaterialId, PermId, PersonId, RelationshipTypeId, SampleId,
    SampleTypeId, SpaceId, VocabularyTermId,
};
use serde::{Deserialize, Serialize};

/// Cursor of raw sample rows.
pub type SampleCursor = BoxedCursor<SampleRow>;

/// Cursor of raw property rows.
pub type PropertyCursor = BoxedCursor<PropertyRow>;

/// Direction of a relationship-edge query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// The id set names children; return their parent edges.
    TowardParents,
    /// The id set names parents; return their child edges.
    TowardChildren,
}

/// A directed relationship edge between two samples.
///
/// Edges are not owned by either sample; they are queried on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Relationship type of this edge.
    pub relationship: RelationshipTypeId,
    /// Parent (or container) side.
    pub parent: SampleId,
    /// Child (or contained) side.
    pub child: SampleId,
}

/// Scope restriction of a pushed-down selector query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScopeFilter {
    /// No scope restriction.
    #[default]
    Any,
    /// Shared-scope samples only.
    Shared,
    /// Samples of one space only.
    Space(SpaceId),
}

/// Pushed-down primary selector query.
///
/// Collapses the original per-selector query methods behind one filter
/// record; a SQL backend turns each populated field into a WHERE clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFilter {
    /// Scope restriction.
    pub scope: ScopeFilter,
    /// Restrict to one sample type.
    pub type_id: Option<SampleTypeId>,
    /// Restrict to samples of one experiment.
    pub experiment_id: Option<ExperimentId>,
    /// Restrict to samples contained in one container.
    pub container_id: Option<SampleId>,
    /// Only samples that have an owning experiment.
    pub with_experiment_only: bool,
}

impl SampleFilter {
    /// True if the given row satisfies this filter.
    ///
    /// Client-side equivalent of the pushed-down predicate; backends may use
    /// it directly when they stream and filter.
    pub fn matches(&self, row: &SampleRow) -> bool {
        let scope_ok = match self.scope {
            ScopeFilter::Any => true,
            ScopeFilter::Shared => row.scope.is_shared(),
            ScopeFilter::Space(space_id) => row.scope.space_id() == Some(space_id),
        };
        scope_ok
            && self.type_id.map_or(true, |t| row.type_id == t)
            && self
                .experiment_id
                .map_or(true, |e| row.experiment_id == Some(e))
            && self
                .container_id
                .map_or(true, |c| row.container_id == Some(c))
            && (!self.with_experiment_only || row.experiment_id.is_some())
    }
}

/// Narrow batch-query interface over the backing store.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (`Send + Sync`); the engine issues independent listing
/// calls from separate threads against one shared store.
pub trait SampleStore: Send + Sync {
    /// Whether the backend supports set-valued predicates (a single query
    /// parameterized by a whole id set). When false, the native set strategy
    /// is never selected and [`SampleStore::get_by_ids`] need not be
    /// implemented efficiently.
    fn supports_set_predicates(&self) -> bool;

    /// Total number of sample rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn count_all(&self) -> ListResult<u64>;

    /// Fetch one sample row by numeric id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn get_by_id(&self, id: SampleId) -> ListResult<Option<SampleRow>>;

    /// Fetch one sample row by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn get_by_code(&self, code: &Code) -> ListResult<Option<SampleRow>>;

    /// Fetch one sample row by permanent id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn get_by_perm_id(&self, perm_id: &PermId) -> ListResult<Option<SampleRow>>;

    /// Fetch the rows of a whole id set in one round trip.
    ///
    /// Only called when [`SampleStore::supports_set_predicates`] is true.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn get_by_ids(&self, ids: &IdSet) -> ListResult<SampleCursor>;

    /// Stream every sample row of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn stream_all(&self) -> ListResult<SampleCursor>;

    /// Stream the rows matching a pushed-down selector filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn stream_filtered(&self, filter: &SampleFilter) -> ListResult<SampleCursor>;

    /// Fetch the relationship edges of one type touching the given id set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn relationship_edges(
        &self,
        relationship: RelationshipTypeId,
        direction: EdgeDirection,
        ids: &IdSet,
    ) -> ListResult<Vec<RelationshipEdge>>;

    /// Fetch the property rows of one variant for the given sample id set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn property_rows(&self, variant: PropertyVariant, ids: &IdSet) -> ListResult<PropertyCursor>;

    /// Stream every property row of one variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn stream_all_properties(&self, variant: PropertyVariant) -> ListResult<PropertyCursor>;

    /// All sample type descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn sample_types(&self) -> ListResult<Vec<SampleType>>;

    /// One sample type descriptor by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn sample_type_by_code(&self, code: &Code) -> ListResult<Option<SampleType>>;

    /// All space descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn spaces(&self) -> ListResult<Vec<Space>>;

    /// All property type descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn property_types(&self) -> ListResult<Vec<PropertyType>>;

    /// One experiment descriptor by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn experiment(&self, id: ExperimentId) -> ListResult<Option<Experiment>>;

    /// One person descriptor by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn person(&self, id: PersonId) -> ListResult<Option<Person>>;

    /// One vocabulary term by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn vocabulary_term(&self, id: VocabularyTermId) -> ListResult<Option<VocabularyTerm>>;

    /// One material by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    fn material(&self, id: MaterialId) -> ListResult<Option<MaterialRef>>;
}
