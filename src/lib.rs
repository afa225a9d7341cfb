//! lodestar - retrieval-augmented question answering
//!
//! This is the convenience wrapper crate that re-exports the engine and
//! its building blocks under one name.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! lodestar = "0.1"
//! ```
//!
//! Ingest a directory, then ask questions against what was stored:
//!
//! ```no_run
//! use lodestar::prelude::*;
//!
//! # async fn run() -> Result<(), RagError> {
//! let config = Config::load_or_default().with_env_api_key();
//! let engine = RagEngine::connect(&config).await?;
//! engine.ingest_dir("./docs").await?;
//! let answer = engine.ask("what does the gateway validate?", 5).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

// Re-export core
pub use lodestar_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use lodestar_core::{
        Answer, Config, Document, DocumentKind, IngestReport, RagEngine, RagError, SearchResult,
    };
}
