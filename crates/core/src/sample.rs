//! Sample records and materialized sample entities
//!
//! Two layers:
//! - [`SampleRow`] is the raw record the store hands back, one per table row.
//! - [`Sample`] is the materialized entity assembled by the listing worker,
//!   with its type descriptor, resolved scope, relationships and property
//!   bag attached.
//!
//! Descriptor records ([`SampleType`], [`Space`], [`Experiment`], [`Person`])
//! are shared across samples via `Arc` and never mutated after load.

use crate::property::PropertyValue;
use crate::types::{
    Code, ExperimentId, InstanceId, PermId, PersonId, SampleId, SampleTypeId, SpaceId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Owning scope of a sample: exactly one of a space or the shared root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Owned by a space.
    Space(SpaceId),
    /// Shared across all spaces of the instance.
    Shared,
}

impl Scope {
    /// True if this is the shared scope.
    pub fn is_shared(&self) -> bool {
        matches!(self, Scope::Shared)
    }

    /// The owning space id, if space-scoped.
    pub fn space_id(&self) -> Option<SpaceId> {
        match self {
            Scope::Space(id) => Some(*id),
            Scope::Shared => None,
        }
    }
}

/// Raw sample record as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Numeric id (primary key).
    pub id: SampleId,
    /// Permanent string id.
    pub perm_id: PermId,
    /// Full stored code (composite `CONTAINER:SUB` form for contained samples).
    pub code: Code,
    /// Sample type id.
    pub type_id: SampleTypeId,
    /// Owning database instance.
    pub instance_id: InstanceId,
    /// Owning scope (space or shared).
    pub scope: Scope,
    /// Owning experiment, if assigned to one.
    pub experiment_id: Option<ExperimentId>,
    /// Enclosing container sample, if part of one.
    pub container_id: Option<SampleId>,
    /// Person who registered the sample.
    pub registrator_id: PersonId,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
    /// True if the sample has been invalidated (soft-deleted).
    pub invalidated: bool,
}

/// Sample type descriptor.
///
/// Carries the eager-resolution depth limits for samples of this type:
/// how many generated-from generations and container levels the listing
/// worker resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleType {
    /// Numeric id.
    pub id: SampleTypeId,
    /// Type code.
    pub code: Code,
    /// How many generated-from parent generations to resolve eagerly.
    pub generated_from_depth: u32,
    /// How many container levels to resolve eagerly.
    pub container_depth: u32,
    /// Whether samples of this type appear in listings at all.
    pub listable: bool,
}

/// Space descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Numeric id.
    pub id: SpaceId,
    /// Space code.
    pub code: Code,
    /// Owning database instance.
    pub instance_id: InstanceId,
}

/// Experiment descriptor with its project and space codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    /// Numeric id.
    pub id: ExperimentId,
    /// Experiment code.
    pub code: Code,
    /// Owning project code.
    pub project_code: Code,
    /// Owning space code.
    pub space_code: Code,
    /// Experiment type code.
    pub type_code: Code,
}

/// Person descriptor (sample registrator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Numeric id.
    pub id: PersonId,
    /// Login user id.
    pub user_id: String,
    /// Email address.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// Materialized sample entity in a result graph.
///
/// Relationship fields hold ids into the owning result graph; they are
/// `None` until the Done phase resolves them, and stay `None` when the
/// target was out of resolution depth or missing from the store.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Numeric id.
    pub id: SampleId,
    /// Permanent string id.
    pub perm_id: PermId,
    /// Display code. For contained samples this is recomposed against the
    /// resolved container in the Done phase.
    pub code: Code,
    /// Code without the container prefix.
    pub sub_code: String,
    /// Type descriptor, shared across samples of the same type.
    pub sample_type: Arc<SampleType>,
    /// Owning scope.
    pub scope: Scope,
    /// Resolved owning space (primary samples only).
    pub space: Option<Arc<Space>>,
    /// Resolved owning experiment (primary samples only).
    pub experiment: Option<Arc<Experiment>>,
    /// Resolved registrator (primary samples only).
    pub registrator: Option<Arc<Person>>,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
    /// True if the sample has been invalidated.
    pub invalidated: bool,
    /// Container id recorded on the row, resolved or not.
    pub container_id: Option<SampleId>,
    /// Resolved container reference (id into the result graph).
    pub container: Option<SampleId>,
    /// Resolved generated-from parent reference (id into the result graph).
    pub generated_from: Option<SampleId>,
    /// Typed property values attached by enrichment.
    pub properties: Vec<PropertyValue>,
    /// True if the sample matched the primary selector (as opposed to being
    /// pulled in by relationship resolution).
    pub is_primary: bool,
}

impl Sample {
    /// Build a sample from a raw row and its type descriptor.
    ///
    /// Scope, experiment and registrator references start unresolved; the
    /// listing worker fills them in for primary samples.
    pub fn from_row(row: &SampleRow, sample_type: Arc<SampleType>, is_primary: bool) -> Self {
        Sample {
            id: row.id,
            perm_id: row.perm_id.clone(),
            sub_code: row.code.sub_code().to_string(),
            code: row.code.clone(),
            sample_type,
            scope: row.scope,
            space: None,
            experiment: None,
            registrator: None,
            registered_at: row.registered_at,
            invalidated: row.invalidated,
            container_id: row.container_id,
            container: None,
            generated_from: None,
            properties: Vec::new(),
            is_primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SampleRow {
        SampleRow {
            id: SampleId::new(1),
            perm_id: PermId::new("20090101000000001-1"),
            code: Code::new("PLATE1:A01"),
            type_id: SampleTypeId::new(5),
            instance_id: InstanceId::new(1),
            scope: Scope::Space(SpaceId::new(3)),
            experiment_id: None,
            container_id: Some(SampleId::new(9)),
            registrator_id: PersonId::new(2),
            registered_at: Utc::now(),
            invalidated: false,
        }
    }

    fn well_type() -> Arc<SampleType> {
        Arc::new(SampleType {
            id: SampleTypeId::new(5),
            code: Code::new("WELL"),
            generated_from_depth: 1,
            container_depth: 1,
            listable: true,
        })
    }

    #[test]
    fn from_row_extracts_sub_code() {
        let sample = Sample::from_row(&row(), well_type(), true);
        assert_eq!(sample.sub_code, "A01");
        assert_eq!(sample.code, Code::new("PLATE1:A01"));
    }

    #[test]
    fn from_row_records_container_without_resolving_it() {
        let sample = Sample::from_row(&row(), well_type(), false);
        assert_eq!(sample.container_id, Some(SampleId::new(9)));
        assert_eq!(sample.container, None);
        assert_eq!(sample.generated_from, None);
        assert!(sample.properties.is_empty());
    }

    #[test]
    fn scope_is_exactly_space_or_shared() {
        let space = Scope::Space(SpaceId::new(3));
        assert!(!space.is_shared());
        assert_eq!(space.space_id(), Some(SpaceId::new(3)));

        let shared = Scope::Shared;
        assert!(shared.is_shared());
        assert_eq!(shared.space_id(), None);
    }

    #[test]
    fn primary_flag_is_carried() {
        assert!(Sample::from_row(&row(), well_type(), true).is_primary);
        assert!(!Sample::from_row(&row(), well_type(), false).is_primary);
    }
}
