//! Typed property values and their raw row forms
//!
//! A sample's property bag holds values of three variants sharing a common
//! (sample id, property type id) key: generic scalars, controlled-vocabulary
//! terms, and material references. The store exposes each variant as its own
//! row shape; [`PropertyVariant`] selects which shape a call fetches.

use crate::types::{Code, MaterialId, PropertyTypeId, SampleId, VocabularyTermId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which of the three property row shapes a store call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyVariant {
    /// Free-text / scalar values.
    Generic,
    /// Controlled-vocabulary term references.
    Vocabulary,
    /// Material references.
    Material,
}

impl PropertyVariant {
    /// All three variants, in the order enrichment processes them.
    pub const ALL: [PropertyVariant; 3] = [
        PropertyVariant::Generic,
        PropertyVariant::Vocabulary,
        PropertyVariant::Material,
    ];
}

/// Property type descriptor, shared across all values of that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    /// Numeric id.
    pub id: PropertyTypeId,
    /// Property type code.
    pub code: Code,
    /// Human-readable label.
    pub label: String,
}

/// Controlled-vocabulary term record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    /// Numeric id.
    pub id: VocabularyTermId,
    /// Term code.
    pub code: Code,
    /// Optional display label.
    pub label: Option<String>,
}

/// Material reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRef {
    /// Numeric id.
    pub id: MaterialId,
    /// Material code.
    pub code: Code,
    /// Material type code.
    pub type_code: Code,
}

/// Raw payload of a property row, one variant per row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyPayload {
    /// Scalar value stored inline.
    Generic(String),
    /// Reference to a vocabulary term.
    Term(VocabularyTermId),
    /// Reference to a material.
    Material(MaterialId),
}

/// Raw property row as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    /// Owning sample.
    pub sample_id: SampleId,
    /// Property type of this value.
    pub property_type_id: PropertyTypeId,
    /// Variant payload.
    pub payload: PropertyPayload,
}

impl PropertyRow {
    /// The variant this row belongs to.
    pub fn variant(&self) -> PropertyVariant {
        match self.payload {
            PropertyPayload::Generic(_) => PropertyVariant::Generic,
            PropertyPayload::Term(_) => PropertyVariant::Vocabulary,
            PropertyPayload::Material(_) => PropertyVariant::Material,
        }
    }
}

/// A typed property value attached to a sample.
///
/// Term and material descriptors are shared (`Arc`) between all values that
/// reference the same term/material within one enrichment call.
#[derive(Debug, Clone)]
pub struct PropertyValue {
    /// Property type descriptor.
    pub property_type: Arc<PropertyType>,
    /// The value itself.
    pub value: TypedValue,
}

/// The three value variants of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// Generic scalar value.
    Generic(String),
    /// Controlled-vocabulary term.
    Term(Arc<VocabularyTerm>),
    /// Material reference.
    Material(Arc<MaterialRef>),
}

impl TypedValue {
    /// A string rendering of the value (term/material codes for references).
    pub fn display_value(&self) -> &str {
        match self {
            TypedValue::Generic(v) => v,
            TypedValue::Term(t) => t.code.as_str(),
            TypedValue::Material(m) => m.code.as_str(),
        }
    }
}
