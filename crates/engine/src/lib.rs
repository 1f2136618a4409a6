//! samplist-engine: the listing engine
//!
//! Ties the pieces together: strategy selection ([`strategy`]), property
//! enrichment ([`enrich`]), the result graph ([`graph`]) and the per-call
//! listing worker behind the [`SampleLister`] facade ([`worker`]).
//!
//! # Quick start
//!
//! ```ignore
//! use samplist_engine::{ListerConfig, SampleLister};
//! use samplist_core::ListingCriteria;
//!
//! let lister = SampleLister::new(store, ListerConfig::default());
//! let graph = lister.list(&ListingCriteria::for_ids([id]))?;
//! for sample in graph.primaries() {
//!     println!("{} ({})", sample.code, sample.sample_type.code);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod enrich;
pub mod graph;
pub mod strategy;
pub mod worker;

pub use config::{ListerConfig, DEFAULT_COUNT_MAX_AGE_SECS, DEFAULT_FULL_SCAN_THRESHOLD};
pub use enrich::{PropertyEnricher, PropertyHolderResolver, PropertyTypeCatalog};
pub use graph::ResultGraph;
pub use strategy::{
    choose_strategy, make_set_query, CachedCount, SetQuery, StrategyChooser, StrategyKind,
};
pub use worker::SampleLister;
