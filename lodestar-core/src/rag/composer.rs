//! Grounded answer composition.
//!
//! Renders the retrieved fragments into a prompt, makes one generation
//! call and pairs the model's answer with source lines derived from chunk
//! metadata.

use super::types::{Answer, SearchResult};
use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Stands in for the source list when no retrieved chunk carries source
/// metadata, so the rendered answer keeps its shape.
const NO_SOURCES_LINE: &str = "- (source metadata unavailable)";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Generation failed: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ComposeError>;

/// Turns retrieved fragments into a grounded answer with cited sources.
#[derive(Clone)]
pub struct Composer {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Composer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Asks the model to answer `question` strictly from `results`.
    ///
    /// An empty body is a valid outcome: the model returned no text part.
    /// Callers can tell that apart from a failed call, which is an error.
    pub async fn compose(&self, question: &str, results: &[SearchResult]) -> Result<Answer> {
        let prompt = build_prompt(question, results);
        debug!(fragments = results.len(), "composing answer");

        let response = self.provider.generate(&self.model, &prompt).await?;
        let body = response.first_text().unwrap_or_default().to_string();

        Ok(Answer {
            body,
            sources: source_lines(results),
        })
    }
}

/// Numbered fragment sections in retrieval order, then the question and
/// the grounding instructions.
fn build_prompt(question: &str, results: &[SearchResult]) -> String {
    let mut fragments = String::new();
    for (i, result) in results.iter().enumerate() {
        fragments.push_str(&format!("### Fragment {}\n{}\n\n", i + 1, result.text));
    }

    format!(
        "You are an assistant that answers strictly from the provided context.\n\
         Question: {question}\n\n\
         Context (fragments, quoting is fine):\n\
         {fragments}\
         Requirements:\n\
         - Answer briefly and to the point; if the context is not enough, say so honestly.\n\
         - End with a \"Sources\" section listing the links/paths from the metadata.\n"
    )
}

/// One line per result that carries a non-empty `source`, in retrieval
/// order. Repeats are kept as-is.
fn source_lines(results: &[SearchResult]) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .filter_map(|result| {
            result
                .metadata
                .get("source")
                .filter(|source| !source.is_empty())
                .map(|source| format!("- {} (dist={:.4})", source, result.distance))
        })
        .collect();

    if lines.is_empty() {
        lines.push(NO_SOURCES_LINE.to_string());
    }
    lines
}
