// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection schema derivation.
//!
//! Translates a [`ModelDescription`](crate::model::ModelDescription) plus a
//! [`CollectionConfig`] into the engine's [`CollectionSchema`].
//!
//! # Architecture
//!
//! ```text
//! ModelDescription + CollectionConfig
//!     ↓
//! SchemaBuilder ──┬─→ field descriptors (scalars, geopoints)
//!                 └─→ RelationResolver (parents, children) ← CollectionRegistry
//!     ↓
//! CollectionSchema ──→ SchemaDiff (vs remote) ──→ SchemaUpdate
//! ```
//!
//! # Example
//!
//! ```
//! use typesense_sync::model::{Attribute, ModelDescription, NativeType};
//! use typesense_sync::schema::{CollectionConfig, CollectionRegistry, FieldType, SchemaBuilder};
//!
//! let model = ModelDescription::new("Book")
//!     .attribute(Attribute::new("title", NativeType::Char))
//!     .attribute(Attribute::new("publication_year", NativeType::Integer));
//! let config = CollectionConfig::default().facet_fields(["title"]);
//! let registry = CollectionRegistry::new();
//!
//! let schema = SchemaBuilder::new(&model, &config, &registry).build().unwrap();
//! assert_eq!(schema.name, "book");
//! assert_eq!(schema.fields[1].field_type, FieldType::Int32);
//! assert!(schema.fields[0].facet);
//! ```
//!
//! Derivation is pure: every failure is a [`SchemaError`] raised before any
//! network traffic.

mod builder;
mod diff;
mod field;
mod options;
mod registry;
mod relations;

pub use builder::{validate_default_sorting_field, SchemaBuilder};
pub use diff::{DropField, FieldChange, SchemaDiff, SchemaUpdate};
pub use field::{
    describe_attribute, describe_geopoint, map_native_type, FieldFlags, FieldType, SchemaField,
};
pub use options::{CollectionConfig, GeopointPair, IndexFields, Selection, SortSelection};
pub use registry::CollectionRegistry;
pub use relations::{RelationResolver, ResolvedRelation};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::NativeType;

/// Engine-managed document id field.
pub const DOCUMENT_ID_FIELD: &str = "id";

/// Configuration errors detected while deriving a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("collection must index at least one field")]
    EmptyIndexFieldSet,
    #[error("attribute '{attribute}' has unsupported type {native_type}")]
    UnsupportedFieldType {
        attribute: String,
        native_type: NativeType,
    },
    #[error("invalid geopoint pair ({lat}, {lon}): {reason}")]
    InvalidGeopointPair {
        lat: String,
        lon: String,
        reason: String,
    },
    #[error("invalid default sorting field '{field}': {reason}")]
    InvalidSortingField { field: String, reason: String },
    #[error("no collection registered for model '{model}' referenced by '{attribute}'")]
    UnresolvedParentCollection { attribute: String, model: String },
    #[error("'{attribute}' in {option} is not an attribute of the model")]
    UnknownAttribute {
        attribute: String,
        option: &'static str,
    },
    #[error("field name '{field}' appears more than once")]
    DuplicateFieldName { field: String },
    #[error("attribute '{attribute}': {reason}")]
    ConflictingIndexField { attribute: String, reason: String },
    #[error("'{attribute}' in {option} is not indexed")]
    FieldNotIndexed {
        attribute: String,
        option: &'static str,
    },
    #[error("invalid relation '{attribute}': {reason}")]
    InvalidRelation { attribute: String, reason: String },
    #[error("unsupported relation '{attribute}': {reason}")]
    UnsupportedRelation { attribute: String, reason: String },
}

impl SchemaError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyIndexFieldSet => "empty_index_field_set",
            Self::UnsupportedFieldType { .. } => "unsupported_field_type",
            Self::InvalidGeopointPair { .. } => "invalid_geopoint_pair",
            Self::InvalidSortingField { .. } => "invalid_sorting_field",
            Self::UnresolvedParentCollection { .. } => "unresolved_parent_collection",
            Self::UnknownAttribute { .. } => "unknown_attribute",
            Self::DuplicateFieldName { .. } => "duplicate_field_name",
            Self::ConflictingIndexField { .. } => "conflicting_index_field",
            Self::FieldNotIndexed { .. } => "field_not_indexed",
            Self::InvalidRelation { .. } => "invalid_relation",
            Self::UnsupportedRelation { .. } => "unsupported_relation",
        }
    }
}

/// The engine reports "no default sorting field" as an empty string.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A collection schema, derived locally or read back from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_sorting_field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_separators: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols_to_index: Vec<String>,
    #[serde(default)]
    pub enable_nested_fields: bool,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields,
            default_sorting_field: None,
            token_separators: Vec::new(),
            symbols_to_index: Vec::new(),
            enable_nested_fields: false,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
