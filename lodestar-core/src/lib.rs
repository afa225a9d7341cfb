//! lodestar-core - Retrieval-augmented question answering infrastructure
//!
//! Provides the components of the pipeline:
//! - Document collection (plain text, conversation logs, CSV tables)
//! - Word-window chunking with overlap
//! - Embedding generation through the Gemini API
//! - A Chroma vector store gateway with selectable wire formats
//! - Retrieval and grounded answer composition
//!
//! ## Primary API
//!
//! Users should interact with the pipeline via [`RagEngine`].

// Public modules
pub mod config;
pub mod provider;
pub mod rag;

// Public exports
pub use config::{
    Config, ConfigError, IngestConfig, ProviderConfig, RetrievalConfig, StoreConfig, WireFormat,
};
pub use rag::{
    create_vector_store, Answer, ChromaStore, Composer, Document, DocumentKind, Embedder,
    IngestReport, RagEngine, RagError, Retriever, SearchResult, VectorStore,
};

// Provider exports
pub use provider::{
    Candidate, Content, GeminiProvider, GenerateResponse, Part, Provider, ProviderError,
};
