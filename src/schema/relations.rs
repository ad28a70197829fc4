// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Relation resolution.
//!
//! Turns parent (forward) and child (reverse) relations into schema fields:
//!
//! ```text
//! parent, no joins      author → author_id   string
//! parent, joins         author → author_id   string  reference "author.id"
//! parent to unique fld  reference → reference_number int32 [reference "reference.number"]
//! detailed parent       author → author      object
//! detailed child        chapter → chapter    object[]
//! ```
//!
//! Id fields pointing at the parent's primary key are always `string`, since
//! that is how the engine stores document ids. Resolution is pure: the only
//! input besides the model and config is the [`CollectionRegistry`] snapshot.

use std::collections::BTreeSet;

use crate::model::{Attribute, ModelDescription, RelationKind, RelationTarget};

use super::field::{FieldType, SchemaField};
use super::options::{CollectionConfig, Selection};
use super::registry::CollectionRegistry;
use super::SchemaError;

/// A relation field together with the declared position of its attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelation {
    pub position: usize,
    pub field: SchemaField,
}

/// Stateless resolver over a registry snapshot.
pub struct RelationResolver<'a> {
    registry: &'a CollectionRegistry,
}

impl<'a> RelationResolver<'a> {
    pub fn new(registry: &'a CollectionRegistry) -> Self {
        Self { registry }
    }

    /// Forward relations selected as parents, in declaration order.
    pub fn parent_names(
        &self,
        model: &ModelDescription,
        parents: &Selection,
    ) -> Result<BTreeSet<String>, SchemaError> {
        let mut names = BTreeSet::new();

        for attribute in &model.attributes {
            let Some(target) = attribute.relation.as_ref() else {
                continue;
            };
            match parents {
                Selection::None => {}
                Selection::All => {
                    if target.kind == RelationKind::ManyToMany {
                        // Explicit link models are indexed as their own collection.
                        if target.through.is_none() {
                            return Err(implicit_many_to_many(attribute));
                        }
                    } else if target.kind.is_parent() {
                        names.insert(attribute.name.clone());
                    }
                }
                Selection::Only(selected) => {
                    if selected.contains(&attribute.name) {
                        ensure_parent(attribute, target)?;
                        names.insert(attribute.name.clone());
                    }
                }
            }
        }

        for name in parents.explicit() {
            match model.get(name) {
                None => {
                    return Err(SchemaError::UnknownAttribute {
                        attribute: name.to_string(),
                        option: "parents",
                    })
                }
                Some(attribute) if !attribute.is_relation() => {
                    return Err(SchemaError::InvalidRelation {
                        attribute: name.to_string(),
                        reason: "attribute is not a relation".into(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(names)
    }

    /// Forward relations selected as detailed parents.
    /// A detailed parent counts as a parent on its own.
    pub fn detailed_parent_names(
        &self,
        model: &ModelDescription,
        detailed: &Selection,
    ) -> Result<BTreeSet<String>, SchemaError> {
        for name in detailed.explicit() {
            let attribute = model.get(name).ok_or_else(|| SchemaError::UnknownAttribute {
                attribute: name.to_string(),
                option: "detailed_parents",
            })?;
            match attribute.relation.as_ref() {
                Some(target) => ensure_parent(attribute, target)?,
                None => {
                    return Err(SchemaError::InvalidRelation {
                        attribute: name.to_string(),
                        reason: "detailed parent is not a relation".into(),
                    })
                }
            }
        }

        Ok(model
            .attributes
            .iter()
            .filter(|a| a.relation_kind().is_some_and(|kind| kind.is_parent()))
            .filter(|a| detailed.contains(&a.name))
            .map(|a| a.name.clone())
            .collect())
    }

    /// Resolve every relation field the configuration asks for.
    ///
    /// A parent selected through `parents` yields its id field. A detailed
    /// parent yields an `object` field, preceded by the id field when joins
    /// are on so the reference can still be followed.
    pub fn resolve(
        &self,
        model: &ModelDescription,
        config: &CollectionConfig,
    ) -> Result<Vec<ResolvedRelation>, SchemaError> {
        let parents = self.parent_names(model, &config.parents)?;
        let detailed = self.detailed_parent_names(model, &config.detailed_parents)?;
        self.validate_children(model, config)?;

        let mut resolved = Vec::new();
        for (position, attribute) in model.attributes.iter().enumerate() {
            let Some(target) = attribute.relation.as_ref() else {
                continue;
            };

            let is_detailed = detailed.contains(&attribute.name);
            if parents.contains(&attribute.name) || is_detailed && config.use_joins {
                let field = self.parent_id_field(attribute, target, config)?;
                resolved.push(ResolvedRelation { position, field });
            }
            if is_detailed {
                let field = nested_field(attribute, FieldType::Object, config);
                resolved.push(ResolvedRelation { position, field });
            } else if target.kind == RelationKind::Reverse
                && config.detailed_children.contains(&attribute.name)
            {
                let field = nested_field(attribute, FieldType::ObjectArray, config).optional(true);
                resolved.push(ResolvedRelation { position, field });
            }
        }

        Ok(resolved)
    }

    fn validate_children(
        &self,
        model: &ModelDescription,
        config: &CollectionConfig,
    ) -> Result<(), SchemaError> {
        for name in config.detailed_children.explicit() {
            let attribute = model.get(name).ok_or_else(|| SchemaError::UnknownAttribute {
                attribute: name.to_string(),
                option: "detailed_children",
            })?;
            if attribute.relation_kind() != Some(RelationKind::Reverse) {
                return Err(SchemaError::InvalidRelation {
                    attribute: name.to_string(),
                    reason: "detailed child is not a reverse relation".into(),
                });
            }
        }

        Ok(())
    }

    fn parent_id_field(
        &self,
        attribute: &Attribute,
        target: &RelationTarget,
        config: &CollectionConfig,
    ) -> Result<SchemaField, SchemaError> {
        let to_field = match target.to_fields.as_slice() {
            [single] => single,
            _ => {
                return Err(SchemaError::UnsupportedRelation {
                    attribute: attribute.name.clone(),
                    reason: format!("composite key over {} fields", target.to_fields.len()),
                })
            }
        };

        let field_type = if target.to_primary_key {
            FieldType::String
        } else {
            FieldType::from_native(target.to_field_type)
                .filter(FieldType::is_reference_type)
                .ok_or_else(|| SchemaError::UnsupportedFieldType {
                    attribute: attribute.name.clone(),
                    native_type: target.to_field_type,
                })?
        };

        let sort = config
            .sorting_fields
            .flag(&attribute.name)
            .unwrap_or(field_type.default_sort());

        let mut field = SchemaField::new(format!("{}_{}", attribute.name, to_field), field_type)
            .facet(config.facets.contains(&attribute.name))
            .sort(sort)
            .optional(attribute.nullable);

        if config.use_joins {
            let collection = self.registry.collection_for(&target.model).ok_or_else(|| {
                SchemaError::UnresolvedParentCollection {
                    attribute: attribute.name.clone(),
                    model: target.model.clone(),
                }
            })?;
            field = field.reference(format!("{}.{}", collection, to_field));
        }

        Ok(field)
    }
}

fn ensure_parent(attribute: &Attribute, target: &RelationTarget) -> Result<(), SchemaError> {
    match target.kind {
        RelationKind::ForeignKey | RelationKind::OneToOne => Ok(()),
        RelationKind::ManyToMany => Err(implicit_many_to_many(attribute)),
        RelationKind::Reverse => Err(SchemaError::InvalidRelation {
            attribute: attribute.name.clone(),
            reason: "reverse relations can only be detailed children".into(),
        }),
    }
}

fn implicit_many_to_many(attribute: &Attribute) -> SchemaError {
    SchemaError::UnsupportedRelation {
        attribute: attribute.name.clone(),
        reason: "many-to-many relations must be indexed through an explicit link model".into(),
    }
}

fn nested_field(
    attribute: &Attribute,
    field_type: FieldType,
    config: &CollectionConfig,
) -> SchemaField {
    SchemaField::new(attribute.name.clone(), field_type)
        .facet(config.facets.contains(&attribute.name))
        .sort(false)
        .optional(attribute.nullable)
}
