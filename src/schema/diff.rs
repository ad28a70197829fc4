// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Schema diffing.
//!
//! Compares a freshly derived schema with the one the engine reports and
//! produces the minimal field-level change set:
//!
//! ```text
//! desired \ remote   absent        same          different
//! present            added         (nothing)     changed → drop + add
//! absent             -             removed       removed
//! ```
//!
//! The engine cannot alter a field in place, so a changed field is sent as a
//! drop followed by a re-add in the same request. The document `id` field is
//! managed by the engine and never diffed, and neither are the flattened
//! sub-fields (`chapter.title`) the engine adds under a desired object field
//! once nested documents are indexed.

use serde::{Deserialize, Serialize};

use super::field::SchemaField;
use super::{CollectionSchema, DOCUMENT_ID_FIELD};

/// Field-level difference between a desired and a remote schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Fields missing remotely, in desired order.
    pub added: Vec<SchemaField>,
    /// Remote field names no longer desired, in remote order.
    pub removed: Vec<String>,
    /// Desired definitions of fields whose remote definition differs.
    pub changed: Vec<SchemaField>,
}

impl SchemaDiff {
    /// Compute the diff. Pure; neither schema is modified.
    #[must_use]
    pub fn between(desired: &CollectionSchema, remote: &CollectionSchema) -> Self {
        let mut diff = Self::default();

        for field in desired.fields.iter().filter(|f| f.name != DOCUMENT_ID_FIELD) {
            match remote.field(&field.name) {
                None => diff.added.push(field.clone()),
                Some(existing) if existing != field => diff.changed.push(field.clone()),
                Some(_) => {}
            }
        }

        for field in remote.fields.iter().filter(|f| f.name != DOCUMENT_ID_FIELD) {
            if desired.field(&field.name).is_none() && !is_nested_under(desired, &field.name) {
                diff.removed.push(field.name.clone());
            }
        }

        diff
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Number of fields touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Update request expressing this diff: drops first, then re-adds and
    /// additions.
    #[must_use]
    pub fn to_update(&self) -> SchemaUpdate {
        let drops = self
            .removed
            .iter()
            .chain(self.changed.iter().map(|f| &f.name))
            .map(|name| FieldChange::Drop(DropField::new(name)));
        let adds = self
            .changed
            .iter()
            .chain(self.added.iter())
            .cloned()
            .map(FieldChange::Add);

        SchemaUpdate {
            fields: drops.chain(adds).collect(),
        }
    }
}

/// Whether `name` is a sub-field of one of the desired object fields.
fn is_nested_under(desired: &CollectionSchema, name: &str) -> bool {
    desired.fields.iter().filter(|f| f.field_type.is_object()).any(|parent| {
        name.strip_prefix(parent.name.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Partial schema sent to the engine's collection update endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaUpdate {
    pub fields: Vec<FieldChange>,
}

/// One entry of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldChange {
    Drop(DropField),
    Add(SchemaField),
}

/// `{"name": "...", "drop": true}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropField {
    pub name: String,
    pub drop: bool,
}

impl DropField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            drop: true,
        }
    }
}
