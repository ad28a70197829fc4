// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection synchronizer.
//!
//! Ties a [`DataModel`] and its [`CollectionConfig`] to a [`SearchClient`]:
//!
//! ```text
//! create():  describe → build schema → POST → register
//! update():  describe → build schema → GET remote → diff → PATCH (if any) → register
//! ```
//!
//! Schema derivation runs before any request, so configuration errors never
//! reach the network. Remote failures are returned as-is and never retried
//! here; retry policy belongs to the client.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::client::{ClientError, SearchClient};
use crate::metrics::{self, LatencyTimer};
use crate::model::{DataModel, ModelDescription};
use crate::schema::{
    CollectionConfig, CollectionRegistry, CollectionSchema, SchemaBuilder, SchemaDiff, SchemaError,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("invalid collection configuration: {0}")]
    SchemaValidation(#[from] SchemaError),
    #[error("collection '{0}' already exists")]
    CollectionAlreadyExists(String),
    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),
    #[error("search engine error: {0}")]
    Remote(ClientError),
}

impl SyncError {
    fn kind(&self) -> &'static str {
        match self {
            Self::SchemaValidation(_) => "schema_validation",
            Self::CollectionAlreadyExists(_) => "already_exists",
            Self::CollectionNotFound(_) => "not_found",
            Self::Remote(_) => "remote",
        }
    }
}

/// Result of [`CollectionSync::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote schema already matched; nothing was sent.
    Unchanged,
    /// The diff was applied.
    Updated(SchemaDiff),
}

impl SyncOutcome {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Keeps one search collection in line with one data model.
pub struct CollectionSync {
    client: Arc<dyn SearchClient>,
    model: Arc<dyn DataModel>,
    config: CollectionConfig,
    registry: Arc<CollectionRegistry>,
}

impl CollectionSync {
    pub fn new(
        client: Arc<dyn SearchClient>,
        model: Arc<dyn DataModel>,
        config: CollectionConfig,
        registry: Arc<CollectionRegistry>,
    ) -> Self {
        Self {
            client,
            model,
            config,
            registry,
        }
    }

    /// Synchronizer with a private, empty registry.
    pub fn standalone(
        client: Arc<dyn SearchClient>,
        model: Arc<dyn DataModel>,
        config: CollectionConfig,
    ) -> Self {
        Self::new(client, model, config, Arc::new(CollectionRegistry::new()))
    }

    #[must_use]
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.registry
    }

    /// Derive the schema locally. No network traffic.
    pub fn schema(&self) -> Result<CollectionSchema, SyncError> {
        self.build(&self.model.describe())
    }

    fn build(&self, description: &ModelDescription) -> Result<CollectionSchema, SyncError> {
        let _timer = LatencyTimer::new("schema", "build");
        SchemaBuilder::new(description, &self.config, &self.registry)
            .build()
            .map_err(|e| {
                metrics::record_schema_error(e.kind());
                SyncError::SchemaValidation(e)
            })
            .map(|schema| {
                metrics::record_schema_fields(schema.fields.len());
                schema
            })
    }

    /// Create the collection. Sends exactly one create request.
    pub async fn create(&self) -> Result<CollectionSchema, SyncError> {
        let _timer = LatencyTimer::new("sync", "create");
        let result = self.create_inner().await;
        record("create", &result.as_ref().map(|_| "success"));
        result
    }

    async fn create_inner(&self) -> Result<CollectionSchema, SyncError> {
        let description = self.model.describe();
        let schema = self.build(&description)?;

        let created = self
            .client
            .create_collection(&schema)
            .await
            .map_err(|e| match e {
                ClientError::AlreadyExists(_) => {
                    SyncError::CollectionAlreadyExists(schema.name.clone())
                }
                other => SyncError::Remote(other),
            })?;

        self.registry.register(&description.name, &schema.name);
        metrics::set_registered_collections(self.registry.len());
        info!(
            model = %description.name,
            collection = %schema.name,
            fields = schema.fields.len(),
            "Collection created"
        );
        Ok(created)
    }

    /// Bring the remote collection in line with the model, sending only
    /// the field-level difference.
    pub async fn update(&self) -> Result<SyncOutcome, SyncError> {
        let _timer = LatencyTimer::new("sync", "update");
        let result = self.update_inner().await;
        let status = result.as_ref().map(|outcome| match outcome {
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Updated(_) => "success",
        });
        record("update", &status);
        result
    }

    async fn update_inner(&self) -> Result<SyncOutcome, SyncError> {
        let description = self.model.describe();
        let desired = self.build(&description)?;

        let remote = self
            .client
            .retrieve_collection(&desired.name)
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => SyncError::CollectionNotFound(desired.name.clone()),
                other => SyncError::Remote(other),
            })?;

        warn_on_collection_settings(&desired, &remote);

        let diff = SchemaDiff::between(&desired, &remote);
        metrics::record_diff(diff.added.len(), diff.removed.len(), diff.changed.len());

        if diff.is_empty() {
            self.registry.register(&description.name, &desired.name);
            metrics::set_registered_collections(self.registry.len());
            info!(collection = %desired.name, "Collection schema unchanged");
            return Ok(SyncOutcome::Unchanged);
        }

        self.client
            .update_collection(&desired.name, &diff.to_update())
            .await
            .map_err(SyncError::Remote)?;

        self.registry.register(&description.name, &desired.name);
        metrics::set_registered_collections(self.registry.len());
        info!(
            collection = %desired.name,
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            "Collection schema updated"
        );
        Ok(SyncOutcome::Updated(diff))
    }
}

/// Collection-level settings the update endpoint cannot change.
fn warn_on_collection_settings(desired: &CollectionSchema, remote: &CollectionSchema) {
    if desired.default_sorting_field != remote.default_sorting_field {
        warn!(
            collection = %desired.name,
            desired = ?desired.default_sorting_field,
            remote = ?remote.default_sorting_field,
            "Default sorting field differs; recreate the collection to change it"
        );
    }
    if desired.enable_nested_fields && !remote.enable_nested_fields {
        warn!(
            collection = %desired.name,
            "Nested fields are disabled on the remote collection; recreate it to enable them"
        );
    }
}

fn record(operation: &str, status: &Result<&str, &SyncError>) {
    match status {
        Ok(status) => metrics::record_sync_operation(operation, status),
        Err(err) => metrics::record_sync_operation(operation, err.kind()),
    }
}
