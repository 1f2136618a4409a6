//! Core types and the backend contract for the sample listing engine
//!
//! This crate defines the foundation the engine builds on:
//! - Identifier newtypes (`SampleId`, `SpaceId`, ...), codes and perm ids
//! - Raw store rows and materialized records (`SampleRow`, `Sample`,
//!   descriptor records)
//! - The three-variant property value model
//! - `ListingCriteria`: one primary selector plus flags
//! - `ListError`: the two-class error taxonomy
//! - `RowCursor`: lazy, single-pass, closable result sequences
//! - `SampleStore`: the narrow batch-query backend contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod criteria;
pub mod cursor;
pub mod error;
pub mod property;
pub mod sample;
pub mod store;
pub mod types;

pub use criteria::{ListingCriteria, PrimarySelector, PropertyMatch};
pub use cursor::{BoxedCursor, ChainCursor, ChainFetch, FilterCursor, RowCursor, VecCursor};
pub use error::{ListError, ListResult};
pub use property::{
    MaterialRef, PropertyPayload, PropertyRow, PropertyType, PropertyValue, PropertyVariant,
    TypedValue, VocabularyTerm,
};
pub use sample::{Experiment, Person, Sample, SampleRow, SampleType, Scope, Space};
pub use store::{
    EdgeDirection, PropertyCursor, RelationshipEdge, SampleCursor, SampleFilter, SampleStore,
    ScopeFilter,
};
pub use types::{
    Code, ExperimentId, IdSet, InstanceId, MaterialId, PermId, PersonId, PropertyTypeId,
    RelationshipTypeId, SampleId, SampleTypeId, SpaceId, VocabularyTermId,
};
