// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Registry of collections known to exist for each model.
//!
//! Join fields reference the parent's collection by name, so the relation
//! resolver needs to know which collection a parent model was synced to.
//! Collections are registered explicitly or by a successful
//! [`crate::CollectionSync::create`] / [`crate::CollectionSync::update`].
//!
//! # Example
//!
//! ```
//! use typesense_sync::schema::CollectionRegistry;
//!
//! let registry = CollectionRegistry::new();
//! registry.register("Author", "author");
//!
//! assert_eq!(registry.collection_for("Author").as_deref(), Some("author"));
//! assert_eq!(registry.collection_for("Publisher"), None);
//! ```
//!
//! Thread-safe: uses `parking_lot::RwLock` for concurrent reads.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Model name → collection name mapping.
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    collections: RwLock<HashMap<String, String>>,
}

impl CollectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-point) the collection for a model.
    pub fn register(&self, model: &str, collection: &str) {
        self.collections
            .write()
            .insert(model.to_string(), collection.to_string());
    }

    /// Unregister a model.
    ///
    /// Returns `true` if the model was registered.
    pub fn unregister(&self, model: &str) -> bool {
        self.collections.write().remove(model).is_some()
    }

    /// Collection registered for a model, if any.
    #[must_use]
    pub fn collection_for(&self, model: &str) -> Option<String> {
        self.collections.read().get(model).cloned()
    }

    /// All registered collection names, sorted and deduplicated.
    #[must_use]
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().values().cloned().collect();
        names.sort();
        names.dedup();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }

    pub fn clear(&self) {
        self.collections.write().clear();
    }
}
