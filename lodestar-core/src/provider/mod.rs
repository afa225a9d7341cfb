//! Generative-language service abstraction.
//!
//! One trait covers both calls the pipeline makes, batched embeddings and
//! single-shot generation. The Gemini REST client is the one production
//! implementation; tests substitute their own.

mod gemini;
mod types;

pub use gemini::GeminiProvider;
pub use types::{
    Candidate, Content, GenerateResponse, Part, Provider, ProviderError, Result,
};
