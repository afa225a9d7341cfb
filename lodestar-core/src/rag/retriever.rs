//! Question-time retrieval.
//!
//! Embeds the question with the same model as the chunks, then asks the
//! store for the nearest neighbors. Ranking stays the store's; nothing is
//! re-sorted or deduplicated on this side.

use super::embedder::{Embedder, EmbedderError};
use super::store::{StoreError, VectorStore};
use super::types::SearchResult;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RetrieveError {
    /// `top_k` must be at least one. Checked before any network call.
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    #[error("Embedding the question failed: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("Vector store query failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RetrieveError>;

/// Retrieves the stored chunks nearest to a question.
#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Returns up to `top_k` chunks, closest first.
    ///
    /// Fewer than `top_k` results is not an error; a thin collection
    /// simply returns what it has.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RetrieveError::InvalidTopK(top_k));
        }

        let embedding = self.embedder.embed_one(question).await?;
        debug!(dimension = embedding.len(), top_k, "querying the store");

        let results = self.store.query(&embedding, top_k).await?;
        debug!(results = results.len(), "retrieval finished");
        Ok(results)
    }
}
