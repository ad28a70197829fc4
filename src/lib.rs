// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Typesense Sync
//!
//! Derives Typesense collection schemas from ORM model descriptions and keeps
//! the remote collections in line with them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Data Model                           │
//! │  • DataModel::describe() → ModelDescription                │
//! │  • Attributes with native types, nullability, relations    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Schema Derivation                       │
//! │  • CollectionConfig: index/facet/sort/geopoint/relations   │
//! │  • SchemaBuilder + RelationResolver + CollectionRegistry   │
//! │  • Every configuration error raised before network I/O     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (CollectionSync: create / update)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Search Client                          │
//! │  • SchemaDiff → minimal SchemaUpdate (drop + re-add)       │
//! │  • TypesenseClient (HTTP) or InMemoryClient                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use typesense_sync::model::{Attribute, ModelDescription, NativeType};
//! use typesense_sync::{CollectionConfig, CollectionSync, TypesenseClient, TypesenseConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = TypesenseClient::new(TypesenseConfig {
//!         api_key: "xyz".into(),
//!         ..Default::default()
//!     })
//!     .expect("Failed to build client");
//!
//!     let book = ModelDescription::new("Book")
//!         .attribute(Attribute::new("title", NativeType::Char))
//!         .attribute(Attribute::new("author", NativeType::Char))
//!         .attribute(Attribute::new("publication_year", NativeType::Integer));
//!
//!     let config = CollectionConfig::default()
//!         .facet_fields(["author"])
//!         .sorting_fields(["publication_year"]);
//!
//!     let sync = CollectionSync::standalone(Arc::new(client), Arc::new(book), config);
//!     sync.create().await.expect("Failed to create collection");
//!
//!     // Later, after the model or config changed:
//!     let outcome = sync.update().await.expect("Failed to update collection");
//!     println!("{:?}", outcome);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Data model descriptions and the [`DataModel`] trait
//! - [`schema`]: Field mapping, configuration, schema building and diffing
//! - [`client`]: [`SearchClient`] trait with HTTP and in-memory implementations
//! - [`collection`]: The [`CollectionSync`] orchestrating create and update
//! - [`resilience`]: Retry with backoff for remote calls
//! - [`config`]: Client connection settings
//! - [`metrics`]: `metrics` crate instrumentation

pub mod client;
pub mod collection;
pub mod config;
pub mod metrics;
pub mod model;
pub mod resilience;
pub mod schema;

pub use client::{ClientError, InMemoryClient, SearchClient, TypesenseClient};
pub use collection::{CollectionSync, SyncError, SyncOutcome};
pub use config::TypesenseConfig;
pub use metrics::LatencyTimer;
pub use model::{DataModel, ModelDescription};
pub use resilience::retry::RetryConfig;
pub use schema::{
    CollectionConfig, CollectionRegistry, CollectionSchema, SchemaBuilder, SchemaDiff, SchemaError,
};
