// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search engine client abstraction.
//!
//! [`SearchClient`] is the only seam between schema synchronization and the
//! network. Two implementations ship with the crate:
//!
//! - [`TypesenseClient`]: HTTP client for a running Typesense server
//! - [`InMemoryClient`]: in-process engine for tests and dry runs

mod http;
mod memory;

pub use http::TypesenseClient;
pub use memory::InMemoryClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::{CollectionSchema, SchemaUpdate};

/// Failures reported by a search engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("collection '{0}' already exists")]
    AlreadyExists(String),
    #[error("collection '{0}' not found")]
    NotFound(String),
    #[error("search engine rejected request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Worth retrying: the request may not have reached the engine.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Collection management calls used by the synchronizer.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Create a collection, returning the schema as stored by the engine.
    async fn create_collection(
        &self,
        schema: &CollectionSchema,
    ) -> Result<CollectionSchema, ClientError>;

    /// Fetch the current schema of a collection.
    async fn retrieve_collection(&self, name: &str) -> Result<CollectionSchema, ClientError>;

    /// Apply field drops and additions to an existing collection.
    async fn update_collection(&self, name: &str, update: &SchemaUpdate) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_errors_are_transient() {
        assert!(ClientError::Transport("connection refused".into()).is_transient());
        assert!(!ClientError::NotFound("book".into()).is_transient());
        assert!(!ClientError::Api { status: 503, message: "busy".into() }.is_transient());
        assert!(!ClientError::Decode("eof".into()).is_transient());
    }
}
