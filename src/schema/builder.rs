// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Schema builder.
//!
//! Walks a [`ModelDescription`] in declaration order and emits one schema
//! field per indexed attribute, one `geopoint` per configured pair (at the
//! position of its first-declared member) and the relation fields produced by
//! the [`RelationResolver`] at the relation attribute's position.
//!
//! All validation happens here, before any network call.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::model::{ModelDescription, RelationKind};

use super::field::{describe_attribute, describe_geopoint, FieldFlags, FieldType, SchemaField};
use super::options::{CollectionConfig, GeopointPair, IndexFields};
use super::registry::CollectionRegistry;
use super::relations::RelationResolver;
use super::{CollectionSchema, SchemaError, DOCUMENT_ID_FIELD};

/// Derives a [`CollectionSchema`] from a model and its configuration.
pub struct SchemaBuilder<'a> {
    model: &'a ModelDescription,
    config: &'a CollectionConfig,
    registry: &'a CollectionRegistry,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(
        model: &'a ModelDescription,
        config: &'a CollectionConfig,
        registry: &'a CollectionRegistry,
    ) -> Self {
        Self {
            model,
            config,
            registry,
        }
    }

    pub fn build(&self) -> Result<CollectionSchema, SchemaError> {
        self.check_references()?;

        let geopoints = self.geopoint_slots()?;
        let relations = RelationResolver::new(self.registry).resolve(self.model, self.config)?;
        let scalars = self.scalar_attributes(&geopoints);

        let mut relations_at: BTreeMap<usize, Vec<SchemaField>> = BTreeMap::new();
        for relation in relations {
            relations_at.entry(relation.position).or_default().push(relation.field);
        }

        let mut fields = Vec::new();
        for (position, attribute) in self.model.attributes.iter().enumerate() {
            match geopoints.get(&position) {
                Some(GeopointSlot::First(pair)) => {
                    fields.push(self.geopoint_field(pair)?);
                    continue;
                }
                Some(GeopointSlot::Second) => continue,
                None => {}
            }

            if let Some(relation_fields) = relations_at.remove(&position) {
                fields.extend(relation_fields);
            } else if scalars.contains(&attribute.name) {
                fields.push(describe_attribute(attribute, self.flags(&attribute.name))?);
            }
        }

        if self.config.override_id && self.config.index_fields == IndexFields::All {
            fields.push(SchemaField::new(DOCUMENT_ID_FIELD, FieldType::String));
        }

        if fields.is_empty() {
            return Err(SchemaError::EmptyIndexFieldSet);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateFieldName {
                    field: field.name.clone(),
                });
            }
        }

        let enable_nested_fields = fields.iter().any(|f| f.field_type.is_object());
        let schema = CollectionSchema {
            name: self
                .config
                .name
                .clone()
                .unwrap_or_else(|| self.model.collection_name()),
            fields,
            default_sorting_field: self.config.default_sorting_field.clone(),
            token_separators: self.config.token_separators.clone(),
            symbols_to_index: self.config.symbols_to_index.clone(),
            enable_nested_fields,
        };

        self.check_flagged_fields(&scalars, &geopoints)?;
        validate_default_sorting_field(&schema)?;

        debug!(
            collection = %schema.name,
            model = %self.model.name,
            fields = schema.fields.len(),
            "Derived collection schema"
        );

        Ok(schema)
    }

    /// Every configured name must exist in the model.
    fn check_references(&self) -> Result<(), SchemaError> {
        let unknown = |attribute: &str, option: &'static str| SchemaError::UnknownAttribute {
            attribute: attribute.to_string(),
            option,
        };

        if let IndexFields::Only(names) = &self.config.index_fields {
            if names.is_empty() {
                return Err(SchemaError::EmptyIndexFieldSet);
            }
            for name in names {
                if !self.model.contains(name) {
                    return Err(unknown(name, "index_fields"));
                }
                if self.config.skip_index_fields.contains(name) {
                    return Err(SchemaError::ConflictingIndexField {
                        attribute: name.clone(),
                        reason: "listed in both index_fields and skip_index_fields".into(),
                    });
                }
            }
        }

        for name in &self.config.skip_index_fields {
            if !self.model.contains(name) {
                return Err(unknown(name, "skip_index_fields"));
            }
        }
        for name in self.config.facets.explicit() {
            if !self.model.contains(name) {
                return Err(unknown(name, "facets"));
            }
        }
        for name in self.config.sorting_fields.explicit() {
            if !self.model.contains(name) {
                return Err(unknown(name, "sorting_fields"));
            }
        }

        Ok(())
    }

    /// Positions taken by geopoint members. Each pair is emitted at its
    /// first-declared member; the other member is swallowed.
    fn geopoint_slots(&self) -> Result<BTreeMap<usize, GeopointSlot<'a>>, SchemaError> {
        let mut slots = BTreeMap::new();

        for pair in &self.config.geopoints {
            let lat = self.model.position(&pair.lat);
            let lon = self.model.position(&pair.lon);

            let (Some(lat), Some(lon)) = (lat, lon) else {
                // Let the descriptor report which side is missing.
                return Err(self.geopoint_field(pair).err().unwrap_or_else(|| {
                    SchemaError::InvalidGeopointPair {
                        lat: pair.lat.clone(),
                        lon: pair.lon.clone(),
                        reason: "attribute is not in the model".into(),
                    }
                }));
            };

            if slots.contains_key(&lat) || slots.contains_key(&lon) {
                return Err(SchemaError::InvalidGeopointPair {
                    lat: pair.lat.clone(),
                    lon: pair.lon.clone(),
                    reason: "attribute already belongs to another geopoint".into(),
                });
            }

            if let IndexFields::Only(names) = &self.config.index_fields {
                for member in [&pair.lat, &pair.lon] {
                    if names.contains(member) {
                        return Err(SchemaError::ConflictingIndexField {
                            attribute: member.clone(),
                            reason: "geopoint members cannot also be indexed as scalars".into(),
                        });
                    }
                }
            }

            slots.insert(lat.min(lon), GeopointSlot::First(pair));
            if lat != lon {
                slots.insert(lat.max(lon), GeopointSlot::Second);
            }
        }

        Ok(slots)
    }

    fn geopoint_field(&self, pair: &GeopointPair) -> Result<SchemaField, SchemaError> {
        // Flags are configured on the member attributes.
        let (lat, lon) = (self.flags(&pair.lat), self.flags(&pair.lon));
        let flags = FieldFlags {
            facet: lat.facet || lon.facet,
            sort: match (lat.sort, lon.sort) {
                (Some(a), Some(b)) => Some(a || b),
                _ => None,
            },
        };
        describe_geopoint(
            &pair.lat,
            &pair.lon,
            self.model.get(&pair.lat),
            self.model.get(&pair.lon),
            flags,
        )
    }

    /// Names of scalar attributes to index.
    fn scalar_attributes(
        &self,
        geopoints: &BTreeMap<usize, GeopointSlot<'_>>,
    ) -> BTreeSet<String> {
        match &self.config.index_fields {
            IndexFields::Only(names) => names.clone(),
            IndexFields::All => self
                .model
                .attributes
                .iter()
                .enumerate()
                .filter(|(position, attribute)| {
                    !attribute.is_relation()
                        && attribute.name != self.model.primary_key
                        && !geopoints.contains_key(position)
                        && !self.config.skip_index_fields.contains(&attribute.name)
                })
                .map(|(_, attribute)| attribute.name.clone())
                .collect(),
        }
    }

    fn flags(&self, name: &str) -> FieldFlags {
        FieldFlags {
            facet: self.config.facets.contains(name),
            sort: self.config.sorting_fields.flag(name),
        }
    }

    /// Facet/sort selections may only name attributes that end up in the
    /// schema (scalars, relations or geopoint members).
    fn check_flagged_fields(
        &self,
        scalars: &BTreeSet<String>,
        geopoints: &BTreeMap<usize, GeopointSlot<'_>>,
    ) -> Result<(), SchemaError> {
        let emitted = |name: &str| {
            let kind = self.model.get(name).and_then(|a| a.relation_kind());
            scalars.contains(name)
                || self.config.parents.contains(name) && kind.is_some()
                || self.config.detailed_parents.contains(name)
                    && kind.is_some_and(|k| k.is_parent())
                || self.config.detailed_children.contains(name)
                    && kind == Some(RelationKind::Reverse)
                || self
                    .model
                    .position(name)
                    .is_some_and(|p| geopoints.contains_key(&p))
        };

        for name in self.config.facets.explicit() {
            if !emitted(name) {
                return Err(SchemaError::FieldNotIndexed {
                    attribute: name.to_string(),
                    option: "facets",
                });
            }
        }
        for name in self.config.sorting_fields.explicit() {
            if !emitted(name) {
                return Err(SchemaError::FieldNotIndexed {
                    attribute: name.to_string(),
                    option: "sorting_fields",
                });
            }
        }
        Ok(())
    }
}

enum GeopointSlot<'a> {
    First(&'a GeopointPair),
    Second,
}

/// The default sorting field must be a sortable, required field of the
/// schema.
pub fn validate_default_sorting_field(schema: &CollectionSchema) -> Result<(), SchemaError> {
    let Some(name) = schema.default_sorting_field.as_deref() else {
        return Ok(());
    };

    let invalid = |reason: &str| SchemaError::InvalidSortingField {
        field: name.to_string(),
        reason: reason.to_string(),
    };

    let field = schema.field(name).ok_or_else(|| invalid("field is not indexed"))?;
    if !field.sort {
        return Err(invalid("field is not sortable"));
    }
    if field.optional {
        return Err(invalid("field is optional"));
    }
    Ok(())
}
