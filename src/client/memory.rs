// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process search engine.
//!
//! Holds collection schemas in a `DashMap` and applies updates with the same
//! rules the real engine enforces, so synchronizer behavior can be tested
//! without a server. Every request is counted and updates are recorded for
//! inspection.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use super::{ClientError, SearchClient};
use crate::schema::{CollectionSchema, FieldChange, SchemaUpdate, DOCUMENT_ID_FIELD};

pub struct InMemoryClient {
    collections: DashMap<String, CollectionSchema>,
    requests: AtomicUsize,
    mutations: AtomicUsize,
    updates: Mutex<Vec<(String, SchemaUpdate)>>,
    next_failure: Mutex<Option<ClientError>>,
}

impl InMemoryClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            requests: AtomicUsize::new(0),
            mutations: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
            next_failure: Mutex::new(None),
        }
    }

    /// Seed a collection without going through `create_collection`.
    pub fn insert(&self, schema: CollectionSchema) {
        self.collections.insert(schema.name.clone(), schema);
    }

    /// Stored schema, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CollectionSchema> {
        self.collections.get(name).map(|r| r.value().clone())
    }

    /// Fail the next request with `error`.
    pub fn fail_with(&self, error: ClientError) {
        *self.next_failure.lock() = Some(error);
    }

    /// Requests received, successful or not.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Creates and updates that changed stored state.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Applied update requests in arrival order.
    #[must_use]
    pub fn received_updates(&self) -> Vec<(String, SchemaUpdate)> {
        self.updates.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn clear(&self) {
        self.collections.clear();
        self.updates.lock().clear();
    }

    fn begin_request(&self) -> Result<(), ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.next_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

fn bad_request(message: String) -> ClientError {
    ClientError::Api {
        status: 400,
        message,
    }
}

fn check_nested(schema: &CollectionSchema) -> Result<(), ClientError> {
    if schema.enable_nested_fields {
        return Ok(());
    }
    match schema.fields.iter().find(|f| f.field_type.is_object()) {
        Some(field) => Err(bad_request(format!(
            "Type `{}` of field `{}` is invalid unless nested fields are enabled.",
            field.field_type, field.name
        ))),
        None => Ok(()),
    }
}

fn apply(schema: &mut CollectionSchema, update: &SchemaUpdate) -> Result<(), ClientError> {
    for change in &update.fields {
        match change {
            FieldChange::Drop(drop) => {
                let position = schema
                    .fields
                    .iter()
                    .position(|f| f.name == drop.name)
                    .ok_or_else(|| {
                        bad_request(format!(
                            "Field `{}` is not part of collection schema.",
                            drop.name
                        ))
                    })?;
                schema.fields.remove(position);
            }
            FieldChange::Add(field) => {
                if field.name == DOCUMENT_ID_FIELD || schema.field(&field.name).is_some() {
                    return Err(bad_request(format!(
                        "Field `{}` is already part of the schema.",
                        field.name
                    )));
                }
                schema.fields.push(field.clone());
            }
        }
    }
    check_nested(schema)
}

#[async_trait]
impl SearchClient for InMemoryClient {
    async fn create_collection(
        &self,
        schema: &CollectionSchema,
    ) -> Result<CollectionSchema, ClientError> {
        self.begin_request()?;
        check_nested(schema)?;

        let mut stored = schema.clone();
        stored.fields.retain(|f| f.name != DOCUMENT_ID_FIELD);

        match self.collections.entry(schema.name.clone()) {
            Entry::Occupied(_) => Err(ClientError::AlreadyExists(schema.name.clone())),
            Entry::Vacant(slot) => {
                slot.insert(stored.clone());
                self.mutations.fetch_add(1, Ordering::SeqCst);
                debug!(
                    collection = %schema.name,
                    fields = stored.fields.len(),
                    "Collection created in memory"
                );
                Ok(stored)
            }
        }
    }

    async fn retrieve_collection(&self, name: &str) -> Result<CollectionSchema, ClientError> {
        self.begin_request()?;
        self.get(name).ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn update_collection(
        &self,
        name: &str,
        update: &SchemaUpdate,
    ) -> Result<(), ClientError> {
        self.begin_request()?;

        let mut entry = self
            .collections
            .get_mut(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;

        // All-or-nothing: work on a copy and commit only if every change applies.
        let mut updated = entry.value().clone();
        apply(&mut updated, update)?;
        *entry.value_mut() = updated;
        drop(entry);

        self.updates.lock().push((name.to_string(), update.clone()));
        self.mutations.fetch_add(1, Ordering::SeqCst);
        debug!(collection = %name, changes = update.fields.len(), "Collection updated in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DropField, FieldType, SchemaField};
    use std::sync::Arc;

    fn book() -> CollectionSchema {
        CollectionSchema::new(
            "book",
            vec![
                SchemaField::new("title", FieldType::String),
                SchemaField::new("publication_year", FieldType::Int32),
            ],
        )
    }

    #[tokio::test]
    async fn test_new_client_is_empty() {
        let client = InMemoryClient::new();
        assert!(client.is_empty());
        assert_eq!(client.requests(), 0);
        assert_eq!(client.mutations(), 0);
    }

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let client = InMemoryClient::new();
        client.create_collection(&book()).await.unwrap();

        let stored = client.retrieve_collection("book").await.unwrap();
        assert_eq!(stored, book());
        assert_eq!(client.requests(), 2);
        assert_eq!(client.mutations(), 1);
    }

    #[tokio::test]
    async fn test_create_strips_document_id() {
        let client = InMemoryClient::new();
        let mut schema = book();
        schema.fields.push(SchemaField::new("id", FieldType::String));

        let stored = client.create_collection(&schema).await.unwrap();
        assert!(stored.field("id").is_none());
        assert_eq!(stored.fields.len(), 2);
    }

    #[tokio::test]
    async fn test_create_existing_fails_without_mutation() {
        let client = InMemoryClient::new();
        client.insert(book());

        let err = client.create_collection(&book()).await.unwrap_err();
        assert_eq!(err, ClientError::AlreadyExists("book".into()));
        assert_eq!(client.mutations(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_missing() {
        let client = InMemoryClient::new();
        let err = client.retrieve_collection("nope").await.unwrap_err();
        assert_eq!(err, ClientError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_update_applies_drop_then_add() {
        let client = InMemoryClient::new();
        client.insert(book());

        let update = SchemaUpdate {
            fields: vec![
                FieldChange::Drop(DropField::new("title")),
                FieldChange::Add(SchemaField::new("title", FieldType::String).facet(true)),
            ],
        };
        client.update_collection("book", &update).await.unwrap();

        let stored = client.get("book").unwrap();
        assert!(stored.field("title").unwrap().facet);
        assert_eq!(client.received_updates(), vec![("book".to_string(), update)]);
    }

    #[tokio::test]
    async fn test_invalid_update_is_atomic() {
        let client = InMemoryClient::new();
        client.insert(book());

        let update = SchemaUpdate {
            fields: vec![
                FieldChange::Drop(DropField::new("title")),
                FieldChange::Drop(DropField::new("missing")),
            ],
        };
        let err = client.update_collection("book", &update).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 400, .. }));
        assert_eq!(client.get("book").unwrap(), book());
        assert!(client.received_updates().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_add_rejected() {
        let client = InMemoryClient::new();
        client.insert(book());

        let update = SchemaUpdate {
            fields: vec![FieldChange::Add(SchemaField::new("title", FieldType::String))],
        };
        assert!(client.update_collection("book", &update).await.is_err());
    }

    #[tokio::test]
    async fn test_object_fields_require_nesting() {
        let client = InMemoryClient::new();
        let schema =
            CollectionSchema::new("book", vec![SchemaField::new("author", FieldType::Object)]);
        assert!(client.create_collection(&schema).await.is_err());

        let mut nested = schema.clone();
        nested.enable_nested_fields = true;
        assert!(client.create_collection(&nested).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_with_is_one_shot() {
        let client = InMemoryClient::new();
        client.insert(book());
        client.fail_with(ClientError::Transport("connection reset".into()));

        assert!(matches!(
            client.retrieve_collection("book").await,
            Err(ClientError::Transport(_))
        ));
        assert!(client.retrieve_collection("book").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        let client = Arc::new(InMemoryClient::new());
        let mut handles = vec![];

        for i in 0..10 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                let schema = CollectionSchema::new(
                    format!("collection_{}", i),
                    vec![SchemaField::new("name", FieldType::String)],
                );
                client.create_collection(&schema).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(client.len(), 10);
        assert_eq!(client.mutations(), 10);
    }
}
