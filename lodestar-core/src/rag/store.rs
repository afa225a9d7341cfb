//! Vector store abstraction and factory.
//!
//! This module provides a unified interface for the external vector
//! database; the concrete wire format is an adapter picked by
//! configuration, not a separate client type.

use super::chroma_store::ChromaStore;
use super::types::SearchResult;
use crate::config::StoreConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record slices handed to `upsert` disagree in length. Raised
    /// before any request goes out.
    #[error("Upsert slices disagree: {ids} ids, {documents} documents, {embeddings} embeddings")]
    Validation {
        ids: usize,
        documents: usize,
        embeddings: usize,
    },

    /// The request ran past its deadline.
    #[error("Store request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The HTTP request failed below the API layer.
    #[error("Store request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err)
        } else {
            StoreError::Request(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified interface for vector database operations.
///
/// Implementations hold connection settings only; concurrent calls are
/// safe and ordering guarantees are the server's.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Checks that the collection exists and creates it on first use.
    /// Safe to call any number of times.
    async fn ensure_collection(&self) -> Result<()>;

    /// Adds or replaces records by id.
    ///
    /// `ids`, `documents` and `embeddings` must have the same length.
    /// `metadatas` is optional per record; missing or empty maps are left
    /// out of the wire payload instead of being sent as empty objects.
    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
        metadatas: &[HashMap<String, String>],
    ) -> Result<()>;

    /// Returns up to `top_k` records nearest to `embedding`, closest
    /// first, exactly as the store ranked them.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}

/// Creates the vector store gateway for the configured wire format.
///
/// All formats are served by the Chroma client; the config's
/// `wire_format` decides which dialect it speaks.
pub fn create_vector_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let store = ChromaStore::new(config)?;
    Ok(Arc::new(store))
}
