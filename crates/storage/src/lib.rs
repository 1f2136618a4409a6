//! In-memory reference backend for the sample listing engine
//!
//! Provides [`MemoryStore`], a complete implementation of the
//! `SampleStore` contract over lock-guarded maps. It serves two purposes:
//! the fixture engine for integration tests, and the behavioral reference a
//! real SQL backend can be checked against.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod memory;

pub use memory::MemoryStore;
