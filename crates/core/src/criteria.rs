//! Listing criteria
//!
//! A [`ListingCriteria`] is an immutable query specification: exactly one
//! primary selector plus scope and enrichment flags. The selector is an enum,
//! so supplying zero or two selectors is unrepresentable; what remains for
//! runtime validation is the well-formedness of the selector payload itself
//! (e.g. an explicit id set must not be empty).

use crate::error::{ListError, ListResult};
use crate::types::{Code, ExperimentId, PermId, SampleId};
use serde::{Deserialize, Serialize};

/// The one primary selector of a listing call.
///
/// Selectors are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimarySelector {
    /// Explicit numeric id set.
    Ids(Vec<SampleId>),
    /// Explicit code set.
    Codes(Vec<Code>),
    /// Explicit permanent-id set.
    PermIds(Vec<PermId>),
    /// All samples assigned to one experiment.
    OfExperiment(ExperimentId),
    /// All samples contained in one container sample.
    ContainedBy(SampleId),
    /// All samples generated from one parent sample.
    ChildrenOf(SampleId),
    /// All samples of one space (optionally further restricted by the
    /// single-type flag and the scope flags).
    OfSpace(Code),
    /// All samples of one type, optionally filtered by a property match.
    OfType {
        /// Sample type code.
        type_code: Code,
        /// Optional property filter applied to the candidates.
        property: Option<PropertyMatch>,
    },
}

/// Property filter of the type-and-property selector.
///
/// Matches when the sample carries a value of the given property type whose
/// display value equals `value` (term and material values match on their
/// codes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMatch {
    /// Property type code.
    pub property_code: Code,
    /// Expected display value.
    pub value: String,
}

/// Immutable listing query specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCriteria {
    /// The primary selector.
    pub selector: PrimarySelector,
    /// Include samples in the shared scope.
    pub include_shared: bool,
    /// Include space-scoped samples.
    pub include_space: bool,
    /// Exclude samples that have no owning experiment.
    pub require_experiment: bool,
    /// Enrich dependent samples with properties too, not only primary ones.
    pub enrich_dependents: bool,
    /// Restrict the listing to one sample type. Also puts relationship
    /// resolution into single-type mode: depth limits come from this type
    /// alone instead of the union of all types.
    pub single_type: Option<Code>,
}

impl ListingCriteria {
    /// Criteria with the given selector and default flags (both scopes
    /// included, no experiment requirement, primary-only enrichment).
    pub fn new(selector: PrimarySelector) -> Self {
        ListingCriteria {
            selector,
            include_shared: true,
            include_space: true,
            require_experiment: false,
            enrich_dependents: false,
            single_type: None,
        }
    }

    /// List an explicit id set.
    pub fn for_ids(ids: impl IntoIterator<Item = SampleId>) -> Self {
        Self::new(PrimarySelector::Ids(ids.into_iter().collect()))
    }

    /// List an explicit code set.
    pub fn for_codes(codes: impl IntoIterator<Item = Code>) -> Self {
        Self::new(PrimarySelector::Codes(codes.into_iter().collect()))
    }

    /// List an explicit perm-id set.
    pub fn for_perm_ids(perm_ids: impl IntoIterator<Item = PermId>) -> Self {
        Self::new(PrimarySelector::PermIds(perm_ids.into_iter().collect()))
    }

    /// List the samples of one experiment.
    pub fn for_experiment(id: ExperimentId) -> Self {
        Self::new(PrimarySelector::OfExperiment(id))
    }

    /// List the samples contained in one container.
    pub fn for_container(id: SampleId) -> Self {
        Self::new(PrimarySelector::ContainedBy(id))
    }

    /// List the samples generated from one parent.
    pub fn for_parent(id: SampleId) -> Self {
        Self::new(PrimarySelector::ChildrenOf(id))
    }

    /// List the samples of one space.
    pub fn for_space(code: Code) -> Self {
        Self::new(PrimarySelector::OfSpace(code))
    }

    /// List the samples of one type, optionally filtered by a property value.
    pub fn for_type(type_code: Code, property: Option<PropertyMatch>) -> Self {
        Self::new(PrimarySelector::OfType {
            type_code,
            property,
        })
    }

    /// Toggle inclusion of shared-scope samples.
    pub fn include_shared(mut self, include: bool) -> Self {
        self.include_shared = include;
        self
    }

    /// Toggle inclusion of space-scoped samples.
    pub fn include_space(mut self, include: bool) -> Self {
        self.include_space = include;
        self
    }

    /// Exclude samples without an owning experiment.
    pub fn require_experiment(mut self, require: bool) -> Self {
        self.require_experiment = require;
        self
    }

    /// Enrich dependent samples with properties as well.
    pub fn enrich_dependents(mut self, enrich: bool) -> Self {
        self.enrich_dependents = enrich;
        self
    }

    /// Restrict the listing (and depth limits) to one sample type.
    pub fn single_type(mut self, type_code: Code) -> Self {
        self.single_type = Some(type_code);
        self
    }

    /// Validate the criteria before any store call.
    ///
    /// # Errors
    ///
    /// Returns an invalid-criteria error when the selector payload is
    /// malformed: an empty explicit set, or scope flags that exclude
    /// everything.
    pub fn validate(&self) -> ListResult<()> {
        match &self.selector {
            PrimarySelector::Ids(ids) if ids.is_empty() => {
                return Err(ListError::invalid_criteria("empty id set"));
            }
            PrimarySelector::Codes(codes) if codes.is_empty() => {
                return Err(ListError::invalid_criteria("empty code set"));
            }
            PrimarySelector::PermIds(perm_ids) if perm_ids.is_empty() => {
                return Err(ListError::invalid_criteria("empty perm-id set"));
            }
            PrimarySelector::OfType { property, .. } => {
                if let Some(m) = property {
                    if m.value.is_empty() {
                        return Err(ListError::invalid_criteria(
                            "property match with empty value",
                        ));
                    }
                }
            }
            _ => {}
        }
        if !self.include_shared && !self.include_space {
            return Err(ListError::invalid_criteria(
                "both shared and space scopes excluded",
            ));
        }
        Ok(())
    }
}
