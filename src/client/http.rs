// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP client for the Typesense collections API.
//!
//! | Call                  | Request                    |
//! |-----------------------|----------------------------|
//! | `create_collection`   | `POST /collections`        |
//! | `retrieve_collection` | `GET /collections/{name}`  |
//! | `update_collection`   | `PATCH /collections/{name}`|
//!
//! Retrieval is idempotent and retried on transport failures using the
//! configured [`RetryConfig`](crate::RetryConfig). Mutations are sent once.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ClientError, SearchClient};
use crate::config::TypesenseConfig;
use crate::metrics::{self, LatencyTimer};
use crate::resilience::retry::retry;
use crate::schema::{CollectionSchema, SchemaUpdate};

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

pub struct TypesenseClient {
    http: Client,
    config: TypesenseConfig,
    base_url: String,
}

/// Error body returned by the engine.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl TypesenseClient {
    pub fn new(config: TypesenseConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TypesenseConfig {
        &self.config
    }

    fn collections_url(&self) -> String {
        format!("{}/collections", self.base_url)
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base_url, name)
    }

    async fn send(&self, request: RequestBuilder, name: &str) -> Result<Response, ClientError> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, name, &body))
    }

    async fn post(&self, schema: &CollectionSchema) -> Result<CollectionSchema, ClientError> {
        let response = self
            .send(self.http.post(self.collections_url()).json(schema), &schema.name)
            .await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn fetch(&self, name: &str) -> Result<CollectionSchema, ClientError> {
        let response = self.send(self.http.get(self.collection_url(name)), name).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Transport(err.to_string())
    }
}

/// Map a non-success response to the client error taxonomy.
fn status_error(status: StatusCode, name: &str, body: &str) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(name.to_string()),
        StatusCode::CONFLICT => ClientError::AlreadyExists(name.to_string()),
        _ => {
            let message = serde_json::from_str::<ApiMessage>(body)
                .map(|m| m.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            ClientError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn record_outcome<T>(operation: &str, result: &Result<T, ClientError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_client_request(operation, status);
}

#[async_trait]
impl SearchClient for TypesenseClient {
    async fn create_collection(
        &self,
        schema: &CollectionSchema,
    ) -> Result<CollectionSchema, ClientError> {
        let _timer = LatencyTimer::new("client", "create");
        debug!(collection = %schema.name, fields = schema.fields.len(), "POST /collections");

        let result = self.post(schema).await;

        record_outcome("create", &result);
        result
    }

    async fn retrieve_collection(&self, name: &str) -> Result<CollectionSchema, ClientError> {
        let _timer = LatencyTimer::new("client", "retrieve");
        debug!(collection = %name, "GET /collections/{{name}}");

        let result = retry(
            "retrieve_collection",
            &self.config.retry,
            ClientError::is_transient,
            || self.fetch(name),
        )
        .await;

        record_outcome("retrieve", &result);
        result
    }

    async fn update_collection(
        &self,
        name: &str,
        update: &SchemaUpdate,
    ) -> Result<(), ClientError> {
        let _timer = LatencyTimer::new("client", "update");
        debug!(collection = %name, changes = update.fields.len(), "PATCH /collections/{{name}}");

        let result = self
            .send(self.http.patch(self.collection_url(name)).json(update), name)
            .await
            .map(|_| ());

        record_outcome("update", &result);
        result
    }
}
