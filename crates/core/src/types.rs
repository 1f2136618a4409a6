//! Core identifier types for the listing engine
//!
//! This module defines the foundational identifier types:
//! - Numeric newtype ids for every record kind the store hands out
//! - Code: human-readable entity code
//! - PermId: permanent string identifier assigned at registration
//! - IdSet: ordered identifier set used by set-based queries

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an id from its raw store value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw store value of this id.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

numeric_id! {
    /// Numeric id of a sample (the store's primary key).
    SampleId
}
numeric_id! {
    /// Numeric id of a sample type descriptor.
    SampleTypeId
}
numeric_id! {
    /// Numeric id of a space (top-level ownership scope).
    SpaceId
}
numeric_id! {
    /// Numeric id of an experiment.
    ExperimentId
}
numeric_id! {
    /// Numeric id of a registered person.
    PersonId
}
numeric_id! {
    /// Numeric id of a property type descriptor.
    PropertyTypeId
}
numeric_id! {
    /// Numeric id of a controlled-vocabulary term.
    VocabularyTermId
}
numeric_id! {
    /// Numeric id of a material.
    MaterialId
}
numeric_id! {
    /// Numeric id of a relationship type (e.g. the parent/child lineage edge).
    RelationshipTypeId
}
numeric_id! {
    /// Numeric id of a database instance. Samples from a foreign instance
    /// are excluded from listing results.
    InstanceId
}

/// Set of sample ids handed to set-based queries.
///
/// A `BTreeSet` keeps iteration order deterministic, which makes the
/// one-by-one strategy issue its calls in a stable order.
pub type IdSet = BTreeSet<SampleId>;

/// Human-readable entity code.
///
/// A sample stored inside a container carries a composite code of the form
/// `CONTAINER:SUB`; [`Code::sub_code`] extracts the part after the colon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Create a code from a string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sub-code: the part after the container separator, or the whole
    /// code when the sample is not stored in a container.
    pub fn sub_code(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, sub)) => sub,
            None => &self.0,
        }
    }

    /// Compose a display code from a container code and a sub-code.
    pub fn composite(container: &Code, sub_code: &str) -> Code {
        Code(format!("{}:{}", container.0, sub_code))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Code {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// Permanent string identifier assigned when a sample is registered.
///
/// Unlike the numeric id, the perm id is stable across store migrations and
/// is the identifier exposed in permlinks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermId(String);

impl PermId {
    /// Create a perm id from a string.
    pub fn new(perm_id: impl Into<String>) -> Self {
        Self(perm_id.into())
    }

    /// The perm id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermId {
    fn from(perm_id: &str) -> Self {
        Self(perm_id.to_string())
    }
}
