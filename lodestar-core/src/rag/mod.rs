//! Retrieval Augmented Generation (RAG) pipeline.
//!
//! This module implements the full pipeline from raw files to grounded
//! answers.
//!
//! # Overview
//!
//! Two flows share one collection:
//!
//! 1. **Ingestion**: Files become [`Document`]s, documents are split into
//!    overlapping word chunks, chunks are embedded in batches and written
//!    to the vector store together with their metadata.
//! 2. **Question answering**: The question is embedded with the same
//!    model, the nearest chunks are retrieved and a generation model is
//!    asked to answer strictly from them.
//!
//! # Architecture
//!
//! - [`RagEngine`]: Orchestrates both flows
//! - [`chunk_words`]: Word-window chunking
//! - [`Embedder`]: Batched embedding over the model service
//! - [`VectorStore`]: The store gateway, served by [`ChromaStore`]
//! - [`Retriever`]: Question embedding plus nearest-neighbor query
//! - [`Composer`]: Prompt building, generation and source lines

mod chroma_store;
mod chunker;
mod composer;
mod embedder;
mod ingest;
mod retriever;
mod store;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use chroma_store::ChromaStore;
pub use chunker::{chunk_words, ChunkWords};
pub use composer::{ComposeError, Composer};
pub use embedder::{Embedder, EmbedderError};
pub use ingest::{collect_documents, IngestError};
pub use retriever::{RetrieveError, Retriever};
pub use store::{create_vector_store, StoreError, VectorStore};
pub use types::{Answer, Document, DocumentKind, SearchResult};

use crate::config::Config;
use crate::provider::{GeminiProvider, Provider, ProviderError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),
}

pub type Result<T> = std::result::Result<T, RagError>;

/// Counts reported after an ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    /// Documents collected from the input
    pub documents: usize,
    /// Chunks embedded and stored
    pub chunks: usize,
}

/// The engine orchestrating ingestion and question answering.
///
/// # Thread Safety
///
/// The engine is `Clone` and safe to share across tasks. It keeps no
/// mutable state; the vector store owns all persistence.
#[derive(Clone)]
pub struct RagEngine {
    embedder: Embedder,
    retriever: Retriever,
    composer: Composer,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
}

impl RagEngine {
    /// Creates an engine over explicit gateways.
    ///
    /// The seams stay injectable for tests; [`connect`](Self::connect)
    /// wires up the real services.
    pub fn new(config: &Config, provider: Arc<dyn Provider>, store: Arc<dyn VectorStore>) -> Self {
        let embedder = Embedder::new(
            provider.clone(),
            config.provider.embedding_model.clone(),
            config.ingest.dimension,
            config.ingest.batch_size,
        );
        let retriever = Retriever::new(embedder.clone(), store.clone());
        let composer = Composer::new(provider, config.provider.generation_model.clone());

        Self {
            embedder,
            retriever,
            composer,
            store,
            chunk_size: config.ingest.chunk_size,
            chunk_overlap: config.ingest.chunk_overlap,
            batch_size: config.ingest.batch_size.max(1),
        }
    }

    /// Connects to the configured Gemini and Chroma endpoints and makes
    /// sure the collection exists.
    pub async fn connect(config: &Config) -> Result<Self> {
        let provider = Arc::new(GeminiProvider::new(&config.provider)?);
        let store = create_vector_store(&config.store)?;
        store.ensure_collection().await?;
        Ok(Self::new(config, provider, store))
    }

    /// Ingests every supported file under `dir`.
    ///
    /// See [`collect_documents`] for the formats picked up.
    pub async fn ingest_dir(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
        let dir = dir.as_ref();
        let documents = collect_documents(dir).await?;
        info!(documents = documents.len(), dir = %dir.display(), "collected documents");
        self.ingest_documents(documents).await
    }

    /// Chunks, embeds and stores the given documents.
    ///
    /// Chunks are written in batches of the configured size, each batch
    /// embedded in one service call and upserted before the next batch
    /// starts. The first failing batch aborts the run; batches already
    /// written stay in the store.
    ///
    /// Record ids are `doc-<n>` with a counter local to this call.
    // TODO: derive ids from source and chunk position so re-ingesting the
    // same directory updates records in place instead of appending new
    // ones alongside the old.
    pub async fn ingest_documents(&self, documents: Vec<Document>) -> Result<IngestReport> {
        let mut ids = Vec::new();
        let mut texts = Vec::new();
        let mut metadatas = Vec::new();

        for document in &documents {
            let metadata = document.chunk_metadata();
            for chunk in chunk_words(&document.text, self.chunk_size, self.chunk_overlap) {
                let trimmed = chunk.trim();
                if trimmed.is_empty() {
                    continue;
                }
                ids.push(format!("doc-{}", ids.len()));
                texts.push(trimmed.to_string());
                metadatas.push(metadata.clone());
            }
        }

        let total = ids.len();
        for start in (0..total).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(total);
            debug!(start, end, total, "embedding and storing batch");

            let embeddings = self
                .embedder
                .embed_texts(&texts[start..end])
                .await
                .map_err(|err| shift_embed_indices(err, start))?;
            self.store
                .upsert(
                    &ids[start..end],
                    &texts[start..end],
                    &embeddings,
                    &metadatas[start..end],
                )
                .await?;
        }

        let report = IngestReport {
            documents: documents.len(),
            chunks: total,
        };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Answers a question from the stored chunks.
    ///
    /// Retrieves the `top_k` nearest chunks and asks the generation model
    /// for an answer grounded in them. The returned [`Answer`] carries the
    /// model's text and one source line per retrieved chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `top_k` is zero
    /// - Embedding the question or querying the store fails
    /// - The generation call fails
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<Answer> {
        let results = self.retriever.retrieve(question, top_k).await?;
        let answer = self.composer.compose(question, &results).await?;
        Ok(answer)
    }
}

/// Rebases the per-call indices of an embedding failure onto the batch's
/// position within the whole run.
fn shift_embed_indices(err: EmbedderError, offset: usize) -> EmbedderError {
    match err {
        EmbedderError::Batch { start, end, source } => EmbedderError::Batch {
            start: start + offset,
            end: end + offset,
            source,
        },
        EmbedderError::Empty { index } => EmbedderError::Empty {
            index: index + offset,
        },
        EmbedderError::Dimension { index, got, want } => EmbedderError::Dimension {
            index: index + offset,
            got,
            want,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{hit, MockProvider, MockStore};
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.ingest.dimension = 3;
        config.ingest.chunk_size = 4;
        config.ingest.chunk_overlap = 1;
        config.ingest.batch_size = 64;
        config
    }

    fn engine(
        config: &Config,
        provider: Arc<MockProvider>,
        store: Arc<MockStore>,
    ) -> RagEngine {
        RagEngine::new(config, provider, store)
    }

    #[tokio::test]
    async fn test_ingest_embeds_and_stores_the_exact_chunks() {
        let provider = Arc::new(MockProvider::new(3));
        let store = Arc::new(MockStore::new());
        let engine = engine(&test_config(), provider.clone(), store.clone());

        let document = Document::new("w1 w2 w3 w4 w5 w6", "demo.txt", DocumentKind::Text);
        let report = engine.ingest_documents(vec![document]).await.unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 2);

        let calls = provider.embed_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec!["w1 w2 w3 w4".to_string(), "w4 w5 w6".to_string()]
        );

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].ids, vec!["doc-0", "doc-1"]);
        assert_eq!(upserts[0].documents, vec!["w1 w2 w3 w4", "w4 w5 w6"]);
        assert_eq!(upserts[0].embeddings.len(), 2);
        assert_eq!(
            upserts[0].metadatas[0].get("source").map(String::as_str),
            Some("demo.txt")
        );
        assert_eq!(
            upserts[0].metadatas[0].get("type").map(String::as_str),
            Some("txt")
        );
    }

    #[tokio::test]
    async fn test_ids_continue_across_documents() {
        let mut config = test_config();
        config.ingest.chunk_size = 2;
        config.ingest.chunk_overlap = 0;
        let provider = Arc::new(MockProvider::new(3));
        let store = Arc::new(MockStore::new());
        let engine = engine(&config, provider, store.clone());

        let documents = vec![
            Document::new("a b c", "one.txt", DocumentKind::Text),
            Document::new("d e", "two.txt", DocumentKind::Text),
        ];
        let report = engine.ingest_documents(documents).await.unwrap();

        assert_eq!(report.chunks, 3);
        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts[0].ids, vec!["doc-0", "doc-1", "doc-2"]);
        assert_eq!(
            upserts[0].metadatas[2].get("source").map(String::as_str),
            Some("two.txt")
        );
    }

    #[tokio::test]
    async fn test_first_failing_batch_aborts_and_keeps_earlier_writes() {
        let mut config = test_config();
        config.ingest.batch_size = 1;
        let provider = Arc::new(MockProvider::new(3).failing_embed_call(1));
        let store = Arc::new(MockStore::new());
        let engine = engine(&config, provider, store.clone());

        let document = Document::new("w1 w2 w3 w4 w5 w6", "demo.txt", DocumentKind::Text);
        let err = engine.ingest_documents(vec![document]).await.unwrap_err();

        assert!(matches!(
            err,
            RagError::Embedder(EmbedderError::Batch { start: 1, end: 2, .. })
        ));
        // the first batch was written before the second one failed
        assert_eq!(store.upsert_count(), 1);
        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts[0].ids, vec!["doc-0"]);
    }

    #[tokio::test]
    async fn test_blank_documents_store_nothing() {
        let provider = Arc::new(MockProvider::new(3));
        let store = Arc::new(MockStore::new());
        let engine = engine(&test_config(), provider.clone(), store.clone());

        let document = Document::new("  \n\t ", "blank.txt", DocumentKind::Text);
        let report = engine.ingest_documents(vec![document]).await.unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 0);
        assert_eq!(provider.embed_call_count(), 0);
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test]
    async fn test_ask_grounds_the_answer_in_retrieved_chunks() {
        let provider = Arc::new(MockProvider::new(3).with_text_response("42."));
        let store = Arc::new(MockStore::with_results(vec![
            hit("alpha text", "a.txt", 0.1),
            hit("beta text", "b.txt", 0.2),
        ]));
        let engine = engine(&test_config(), provider.clone(), store);

        let answer = engine.ask("what is the answer?", 2).await.unwrap();

        assert_eq!(answer.body, "42.");
        assert_eq!(
            answer.sources,
            vec!["- a.txt (dist=0.1000)", "- b.txt (dist=0.2000)"]
        );

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("what is the answer?"));
        assert!(prompts[0].contains("### Fragment 1\nalpha text"));
    }

    #[tokio::test]
    async fn test_ask_rejects_zero_top_k_without_network() {
        let provider = Arc::new(MockProvider::new(3));
        let store = Arc::new(MockStore::new());
        let engine = engine(&test_config(), provider.clone(), store.clone());

        let err = engine.ask("anything", 0).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::Retrieve(RetrieveError::InvalidTopK(0))
        ));
        assert_eq!(provider.embed_call_count(), 0);
        assert_eq!(store.query_count(), 0);
    }
}
