//! Embedding generation using the model service.
//!
//! This module converts chunk texts and questions into vector embeddings,
//! grouping texts into fixed-size batches to amortize call overhead.

use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The service call for one batch failed. `start..end` are the input
    /// indices the batch covered, so a run can be retried from there.
    #[error("Embedding batch {start}..{end} failed: {source}")]
    Batch {
        start: usize,
        end: usize,
        #[source]
        source: ProviderError,
    },

    /// The service returned no values for the text at `index`.
    #[error("No embedding values returned for text {index}")]
    Empty { index: usize },

    /// A returned vector does not match the collection dimensionality.
    #[error("Embedding for text {index} has {got} dimensions, expected {want}")]
    Dimension {
        index: usize,
        got: usize,
        want: usize,
    },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings for chunks and questions.
///
/// Batches are sent sequentially and results keep input order, so the
/// vector at position `i` always belongs to the text at position `i`.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl Embedder {
    /// A `dimension` of zero requests the service default dimensionality
    /// and disables the length check on returned vectors.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        dimension: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension,
            batch_size: batch_size.max(1),
        }
    }

    /// Embeds all texts, one batch per service call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A batch call fails (keeps the index range of that batch)
    /// - The service returns no values for some text
    /// - A vector disagrees with the configured dimensionality
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        let requested = (self.dimension > 0).then_some(self.dimension);

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let start = batch_index * self.batch_size;
            let end = start + batch.len();
            debug!(start, end, "embedding batch");

            let returned = self
                .provider
                .embed_batch(&self.model, batch, requested)
                .await
                .map_err(|source| EmbedderError::Batch { start, end, source })?;

            if returned.len() != batch.len() {
                return Err(EmbedderError::Empty {
                    index: start + returned.len().min(batch.len()),
                });
            }
            for (offset, vector) in returned.iter().enumerate() {
                if vector.is_empty() {
                    return Err(EmbedderError::Empty {
                        index: start + offset,
                    });
                }
                if self.dimension > 0 && vector.len() != self.dimension {
                    return Err(EmbedderError::Dimension {
                        index: start + offset,
                        got: vector.len(),
                        want: self.dimension,
                    });
                }
            }
            vectors.extend(returned);
        }

        Ok(vectors)
    }

    /// Embeds a single text, the question path.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_texts(&texts).await?;
        vectors.pop().ok_or(EmbedderError::Empty { index: 0 })
    }
}
