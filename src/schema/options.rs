// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Declarative collection configuration.
//!
//! # Example
//!
//! ```
//! use typesense_sync::schema::{CollectionConfig, Selection};
//!
//! let config = CollectionConfig::indexing(["title", "author", "publication_year"])
//!     .facet_fields(["author"])
//!     .sorting_fields(["publication_year"]);
//!
//! assert!(config.facets.contains("author"));
//! assert!(!config.facets.contains("title"));
//! assert_eq!(config.parents, Selection::None);
//! ```

use std::collections::BTreeSet;

/// Which scalar attributes are indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IndexFields {
    /// Every supported non-relation attribute except the primary key,
    /// geopoint members and skipped attributes.
    #[default]
    All,
    /// Exactly these attributes.
    Only(BTreeSet<String>),
}

/// Generic name selection used for facets and relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    /// Explicitly listed names (empty for `None` and `All`).
    pub fn explicit(&self) -> impl Iterator<Item = &str> {
        let names = match self {
            Self::Only(names) => Some(names),
            _ => None,
        };
        names.into_iter().flatten().map(String::as_str)
    }
}

/// Which fields are sortable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortSelection {
    /// Engine default: numeric fields sort, others don't.
    #[default]
    Default,
    All,
    Only(BTreeSet<String>),
}

impl SortSelection {
    /// Explicit sort flag for a field, `None` when the type default applies.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self {
            Self::Default => None,
            Self::All => Some(true),
            Self::Only(names) => Some(names.contains(name)),
        }
    }

    pub fn explicit(&self) -> impl Iterator<Item = &str> {
        let names = match self {
            Self::Only(names) => Some(names),
            _ => None,
        };
        names.into_iter().flatten().map(String::as_str)
    }
}

/// A latitude/longitude attribute pair indexed as one geopoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeopointPair {
    pub lat: String,
    pub lon: String,
}

impl GeopointPair {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

/// Everything that shapes a derived collection schema besides the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Collection name override; defaults to the model's snake_case name.
    pub name: Option<String>,
    pub index_fields: IndexFields,
    /// Attributes excluded from implicit indexing.
    pub skip_index_fields: BTreeSet<String>,
    pub facets: Selection,
    pub sorting_fields: SortSelection,
    pub geopoints: Vec<GeopointPair>,
    /// Forward relations indexed as reference id fields.
    pub parents: Selection,
    /// Attach engine join references to parent id fields.
    pub use_joins: bool,
    /// Parents additionally embedded as nested `object` fields.
    pub detailed_parents: Selection,
    /// Reverse relations embedded as nested `object[]` fields.
    pub detailed_children: Selection,
    pub default_sorting_field: Option<String>,
    /// Index the primary key as the document `id` (implicit index fields only).
    pub override_id: bool,
    pub token_separators: Vec<String>,
    pub symbols_to_index: Vec<String>,
}

fn name_set<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl CollectionConfig {
    /// Config indexing exactly the given attributes.
    pub fn indexing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index_fields: IndexFields::Only(name_set(fields)),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn skip_index_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_index_fields = name_set(fields);
        self
    }

    #[must_use]
    pub fn facets(mut self, facets: Selection) -> Self {
        self.facets = facets;
        self
    }

    #[must_use]
    pub fn facet_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets(Selection::only(fields))
    }

    #[must_use]
    pub fn sort(mut self, sorting: SortSelection) -> Self {
        self.sorting_fields = sorting;
        self
    }

    #[must_use]
    pub fn sorting_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort(SortSelection::Only(name_set(fields)))
    }

    #[must_use]
    pub fn geopoint(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.geopoints.push(GeopointPair::new(lat, lon));
        self
    }

    #[must_use]
    pub fn parents(mut self, parents: Selection) -> Self {
        self.parents = parents;
        self
    }

    #[must_use]
    pub fn parent_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents(Selection::only(fields))
    }

    #[must_use]
    pub fn use_joins(mut self, use_joins: bool) -> Self {
        self.use_joins = use_joins;
        self
    }

    #[must_use]
    pub fn detailed_parents(mut self, selection: Selection) -> Self {
        self.detailed_parents = selection;
        self
    }

    #[must_use]
    pub fn detailed_children(mut self, selection: Selection) -> Self {
        self.detailed_children = selection;
        self
    }

    #[must_use]
    pub fn default_sorting_field(mut self, field: impl Into<String>) -> Self {
        self.default_sorting_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn override_id(mut self, override_id: bool) -> Self {
        self.override_id = override_id;
        self
    }

    #[must_use]
    pub fn token_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.token_separators = separators.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn symbols_to_index<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols_to_index = symbols.into_iter().map(Into::into).collect();
        self
    }
}
