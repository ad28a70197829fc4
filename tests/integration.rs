// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Integration Tests for Typesense Sync
//!
//! Most tests drive [`CollectionSync`] against the in-memory engine. The
//! `live_*` tests run a real Typesense server through testcontainers.
//!
//! # Running Tests
//! ```bash
//! # In-memory tests
//! cargo test --test integration
//!
//! # Live tests (requires Docker)
//! cargo test --test integration live -- --ignored
//! ```
//!
//! # Test Organization
//! - `happy_*` - Normal operation: create, update, relations, geopoints
//! - `failure_*` - Configuration errors and remote failures
//! - `live_*` - Same flows against a Typesense container

use std::sync::Arc;
use std::time::Duration;

use typesense_sync::model::{Attribute, ModelDescription, NativeType, RelationTarget};
use typesense_sync::schema::{FieldChange, FieldType, SchemaField, Selection};
use typesense_sync::{
    ClientError, CollectionConfig, CollectionRegistry, CollectionSync, InMemoryClient, RetryConfig,
    SchemaError, SearchClient, SyncError, SyncOutcome, TypesenseClient, TypesenseConfig,
};

use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

// =============================================================================
// Fixtures
// =============================================================================

fn book_model() -> ModelDescription {
    ModelDescription::new("Book")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("title", NativeType::Char))
        .attribute(Attribute::new("author", NativeType::Char))
        .attribute(Attribute::new("publication_year", NativeType::Integer))
}

fn book_config() -> CollectionConfig {
    CollectionConfig::indexing(["title", "author", "publication_year"]).facet_fields(["author"])
}

fn place_model() -> ModelDescription {
    ModelDescription::new("Place")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("name", NativeType::Char))
        .attribute(Attribute::new("lat", NativeType::Decimal))
        .attribute(Attribute::new("long", NativeType::Decimal))
        .attribute(Attribute::new("rating", NativeType::Float).nullable())
}

fn author_model() -> ModelDescription {
    ModelDescription::new("Author")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("name", NativeType::Char))
        .attribute(Attribute::reverse("book", "Book"))
}

fn novel_model() -> ModelDescription {
    ModelDescription::new("Novel")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("title", NativeType::Char))
        .attribute(Attribute::foreign_key(
            "author",
            RelationTarget::primary_key("Author", NativeType::BigAuto),
        ))
        .attribute(Attribute::new("published_date", NativeType::Date))
}

fn sync(
    client: &Arc<InMemoryClient>,
    model: ModelDescription,
    config: CollectionConfig,
) -> CollectionSync {
    CollectionSync::standalone(client.clone(), Arc::new(model), config)
}

// =============================================================================
// Happy Path Tests
// =============================================================================

#[tokio::test]
async fn happy_book_example() {
    let client = Arc::new(InMemoryClient::new());
    let created = sync(&client, book_model(), book_config()).create().await.unwrap();

    assert_eq!(created.name, "book");
    assert_eq!(
        created.fields,
        vec![
            SchemaField::new("title", FieldType::String),
            SchemaField::new("author", FieldType::String).facet(true),
            SchemaField::new("publication_year", FieldType::Int32).sort(true),
        ]
    );
    assert_eq!(created.default_sorting_field, None);
    assert_eq!(client.mutations(), 1);
}

#[tokio::test]
async fn happy_update_twice_is_noop() {
    let client = Arc::new(InMemoryClient::new());
    let books = sync(&client, book_model(), book_config());
    books.create().await.unwrap();

    assert_eq!(books.update().await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(books.update().await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(client.mutations(), 1);
    assert!(client.received_updates().is_empty());
}

#[tokio::test]
async fn happy_model_change_sends_minimal_update() {
    let client = Arc::new(InMemoryClient::new());
    sync(&client, book_model(), book_config()).create().await.unwrap();

    // "author" dropped from the index, "isbn" added to the model and index.
    let model = book_model().attribute(Attribute::new("isbn", NativeType::Char));
    let config = CollectionConfig::indexing(["title", "publication_year", "isbn"]);
    let outcome = sync(&client, model, config).update().await.unwrap();

    let SyncOutcome::Updated(diff) = outcome else {
        panic!("expected an update");
    };
    assert_eq!(diff.added, vec![SchemaField::new("isbn", FieldType::String)]);
    assert_eq!(diff.removed, vec!["author".to_string()]);
    assert!(diff.changed.is_empty());

    let stored = client.get("book").unwrap();
    let names: Vec<_> = stored.field_names().collect();
    assert_eq!(names, vec!["title", "publication_year", "isbn"]);
}

#[tokio::test]
async fn happy_changed_flags_dropped_and_readded() {
    let client = Arc::new(InMemoryClient::new());
    sync(&client, book_model(), book_config()).create().await.unwrap();

    let config = book_config().sorting_fields(["title"]);
    sync(&client, book_model(), config).update().await.unwrap();

    let (_, update) = client.received_updates().pop().unwrap();
    let drops = update.fields.iter().filter(|c| matches!(c, FieldChange::Drop(_))).count();
    let adds = update.fields.iter().filter(|c| matches!(c, FieldChange::Add(_))).count();
    // title gains sort, publication_year loses it
    assert_eq!(drops, 2);
    assert_eq!(adds, 2);

    let stored = client.get("book").unwrap();
    assert!(stored.field("title").unwrap().sort);
    assert!(!stored.field("publication_year").unwrap().sort);
}

#[tokio::test]
async fn happy_geopoint_pair_is_one_field() {
    let client = Arc::new(InMemoryClient::new());
    let config = CollectionConfig::default()
        .geopoint("lat", "long")
        .default_sorting_field("name")
        .sorting_fields(["name"]);
    let created = sync(&client, place_model(), config).create().await.unwrap();

    let names: Vec<_> = created.field_names().collect();
    assert_eq!(names, vec!["name", "lat_long", "rating"]);
    assert_eq!(created.field("lat_long").unwrap().field_type, FieldType::Geopoint);
    assert!(created.field("lat_long").unwrap().sort);
    assert!(created.field("rating").unwrap().optional);
    assert_eq!(created.default_sorting_field.as_deref(), Some("name"));
}

#[tokio::test]
async fn happy_detailed_relations_enable_nesting() {
    let client = Arc::new(InMemoryClient::new());
    let registry = Arc::new(CollectionRegistry::new());

    let authors = CollectionConfig::default().detailed_children(Selection::only(["book"]));
    let created =
        CollectionSync::new(client.clone(), Arc::new(author_model()), authors, registry.clone())
            .create()
            .await
            .unwrap();
    assert!(created.enable_nested_fields);
    assert_eq!(created.field("book").unwrap().field_type, FieldType::ObjectArray);
    assert!(created.field("book").unwrap().optional);

    let novels = CollectionConfig::default()
        .parents(Selection::All)
        .use_joins(true)
        .detailed_parents(Selection::only(["author"]));
    let created = CollectionSync::new(client.clone(), Arc::new(novel_model()), novels, registry)
        .create()
        .await
        .unwrap();

    let names: Vec<_> = created.field_names().collect();
    assert_eq!(names, vec!["title", "author_id", "author", "published_date"]);
    assert_eq!(created.field("author_id").unwrap().reference.as_deref(), Some("author.id"));
    assert_eq!(created.field("author").unwrap().field_type, FieldType::Object);
    assert_eq!(created.field("published_date").unwrap().field_type, FieldType::Int64);
}

#[tokio::test]
async fn happy_engine_nested_fields_survive_update() {
    let client = Arc::new(InMemoryClient::new());
    let authors = sync(
        &client,
        author_model(),
        CollectionConfig::default().detailed_children(Selection::All),
    );
    authors.create().await.unwrap();

    // The engine flattens indexed child documents into extra schema fields.
    let mut indexed = client.get("author").unwrap();
    indexed
        .fields
        .push(SchemaField::new("book.title", FieldType::StringArray).optional(true));
    client.insert(indexed);

    let outcome = authors.update().await.unwrap();
    assert!(outcome.is_unchanged());
    assert!(client.get("author").unwrap().field("book.title").is_some());
    assert_eq!(client.mutations(), 1);
}

#[tokio::test]
async fn happy_override_id_not_stored_or_diffed() {
    let client = Arc::new(InMemoryClient::new());
    let books = sync(&client, book_model(), CollectionConfig::default().override_id(true));

    let desired = books.schema().unwrap();
    assert_eq!(desired.fields.last().unwrap().name, "id");

    let created = books.create().await.unwrap();
    assert!(created.field("id").is_none());
    assert!(books.update().await.unwrap().is_unchanged());
}

// =============================================================================
// Failure Scenario Tests
// =============================================================================

#[tokio::test]
async fn failure_create_existing_collection() {
    let client = Arc::new(InMemoryClient::new());
    let books = sync(&client, book_model(), book_config());
    books.create().await.unwrap();

    assert_eq!(
        books.create().await.unwrap_err(),
        SyncError::CollectionAlreadyExists("book".into())
    );
    assert_eq!(client.mutations(), 1);
}

#[tokio::test]
async fn failure_update_missing_collection() {
    let client = Arc::new(InMemoryClient::new());
    assert_eq!(
        sync(&client, book_model(), book_config()).update().await.unwrap_err(),
        SyncError::CollectionNotFound("book".into())
    );
}

#[tokio::test]
async fn failure_unknown_names_never_reach_network() {
    let client = Arc::new(InMemoryClient::new());
    let configs = [
        book_config().facet_fields(["publisher"]),
        book_config().sorting_fields(["publisher"]),
        CollectionConfig::default().geopoint("lat", "lng"),
        book_config().parent_fields(["publisher"]),
        CollectionConfig::indexing(["publisher"]),
    ];

    for config in configs {
        let model = if config.geopoints.is_empty() { book_model() } else { place_model() };
        let err = sync(&client, model, config).create().await.unwrap_err();
        assert!(matches!(err, SyncError::SchemaValidation(_)), "unexpected error: {err}");
    }
    assert_eq!(client.requests(), 0);
}

#[tokio::test]
async fn failure_join_without_registered_parent() {
    let client = Arc::new(InMemoryClient::new());
    let config = CollectionConfig::default().parents(Selection::All).use_joins(true);

    let err = sync(&client, novel_model(), config).create().await.unwrap_err();
    assert_eq!(
        err,
        SyncError::SchemaValidation(SchemaError::UnresolvedParentCollection {
            attribute: "author".into(),
            model: "Author".into(),
        })
    );
    assert_eq!(client.requests(), 0);
}

#[tokio::test]
async fn failure_default_sorting_field_must_be_required() {
    let client = Arc::new(InMemoryClient::new());
    let config = CollectionConfig::default().default_sorting_field("rating");

    let err = sync(&client, place_model(), config).create().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::SchemaValidation(SchemaError::InvalidSortingField { .. })
    ));
}

#[tokio::test]
async fn failure_remote_errors_surface_verbatim() {
    let client = Arc::new(InMemoryClient::new());
    let books = sync(&client, book_model(), book_config());
    books.create().await.unwrap();

    let unavailable = ClientError::Api {
        status: 503,
        message: "Not Ready or Lagging".into(),
    };
    client.fail_with(unavailable.clone());
    assert_eq!(books.update().await.unwrap_err(), SyncError::Remote(unavailable));

    // Nothing retried by the synchronizer: one create, one failed retrieve.
    assert_eq!(client.requests(), 2);
}

// =============================================================================
// Live Tests - Typesense container
// =============================================================================

const API_KEY: &str = "sync-test-key";

fn typesense_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("typesense/typesense", "27.1")
        .with_env_var("TYPESENSE_API_KEY", API_KEY)
        .with_env_var("TYPESENSE_DATA_DIR", "/tmp")
        .with_exposed_port(8108)
        .with_wait_for(WaitFor::seconds(2));
    docker.run(image)
}

/// Block until the server reports healthy.
async fn wait_for_health(port: u16) {
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        if let Ok(response) = reqwest::get(&url).await {
            if response.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    panic!("Typesense did not become healthy");
}

fn live_client(port: u16) -> Arc<TypesenseClient> {
    let config = TypesenseConfig {
        host: "127.0.0.1".into(),
        port,
        api_key: API_KEY.into(),
        retry: RetryConfig::startup(),
        ..Default::default()
    };
    Arc::new(TypesenseClient::new(config).expect("Failed to build client"))
}

#[tokio::test]
#[ignore] // Requires Docker
async fn live_create_then_update_roundtrip() {
    let docker = Cli::default();
    let typesense = typesense_container(&docker);
    let port = typesense.get_host_port_ipv4(8108);
    wait_for_health(port).await;

    let client = live_client(port);
    let books = CollectionSync::standalone(client.clone(), Arc::new(book_model()), book_config());

    books.create().await.expect("Failed to create collection");
    assert_eq!(
        books.create().await.unwrap_err(),
        SyncError::CollectionAlreadyExists("book".into())
    );

    // The engine echoes every flag back, so an unchanged config is a no-op.
    assert!(books.update().await.expect("Failed to update").is_unchanged());

    let changed = CollectionSync::standalone(
        client.clone(),
        Arc::new(book_model()),
        book_config().facet_fields(["author", "title"]),
    );
    assert!(!changed.update().await.expect("Failed to update").is_unchanged());

    let remote = client.retrieve_collection("book").await.unwrap();
    assert!(remote.field("title").unwrap().facet);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn live_missing_collection() {
    let docker = Cli::default();
    let typesense = typesense_container(&docker);
    let port = typesense.get_host_port_ipv4(8108);
    wait_for_health(port).await;

    let client = live_client(port);
    assert_eq!(
        client.retrieve_collection("nope").await.unwrap_err(),
        ClientError::NotFound("nope".into())
    );
}

#[tokio::test]
#[ignore] // Requires Docker
async fn live_joined_collections() {
    let docker = Cli::default();
    let typesense = typesense_container(&docker);
    let port = typesense.get_host_port_ipv4(8108);
    wait_for_health(port).await;

    let client = live_client(port);
    let registry = Arc::new(CollectionRegistry::new());

    CollectionSync::new(
        client.clone(),
        Arc::new(author_model()),
        CollectionConfig::default(),
        registry.clone(),
    )
    .create()
    .await
    .expect("Failed to create parent");

    let novels = CollectionConfig::default().parents(Selection::All).use_joins(true);
    let created = CollectionSync::new(client.clone(), Arc::new(novel_model()), novels, registry)
        .create()
        .await
        .expect("Failed to create child");

    assert_eq!(created.field("author_id").unwrap().reference.as_deref(), Some("author.id"));
}
