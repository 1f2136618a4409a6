//! Samplist - bulk sample listing and relationship resolution
//!
//! Samplist materializes large batches of samples from a backing store:
//! it picks a fetch strategy from the requested-set-to-table-size ratio,
//! pulls in related samples (generated-from parents up to each type's
//! depth, containers one level), attaches typed property values and hands
//! back a result graph.
//!
//! # Quick Start
//!
//! ```ignore
//! use samplist::{ListerConfig, ListingCriteria, SampleLister};
//!
//! let lister = SampleLister::new(store, ListerConfig::default());
//!
//! // List every sample of one experiment, with properties.
//! let graph = lister.list(&ListingCriteria::for_experiment(experiment_id))?;
//! for sample in graph.primaries() {
//!     println!("{} ({})", sample.code, sample.sample_type.code);
//! }
//! ```
//!
//! # Architecture
//!
//! The workspace splits into three crates: `samplist-core` (types, the
//! `SampleStore` contract, cursors), `samplist-storage` (the in-memory
//! reference backend) and `samplist-engine` (strategy selection, the
//! listing worker, property enrichment). This crate re-exports the public
//! API of all three.

pub use samplist_core::*;
pub use samplist_engine::{
    CachedCount, ListerConfig, PropertyEnricher, PropertyHolderResolver, PropertyTypeCatalog,
    ResultGraph, SampleLister, SetQuery, StrategyChooser, StrategyKind,
    DEFAULT_COUNT_MAX_AGE_SECS, DEFAULT_FULL_SCAN_THRESHOLD,
};
pub use samplist_storage::MemoryStore;
