use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request ran past its deadline.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The HTTP request failed below the API layer.
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err)
        } else {
            ProviderError::Request(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Boundary to the external embedding + generation service.
///
/// Implementations hold no mutable state beyond their connection settings
/// and are safe to share across concurrent requests.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Embed a batch of texts in a single service call, one vector per
    /// text, in input order.
    ///
    /// `dimension` requests a specific output dimensionality; `None` lets
    /// the service use its default.
    async fn embed_batch(
        &self,
        model: &str,
        texts: &[String],
        dimension: Option<usize>,
    ) -> Result<Vec<Vec<f32>>>;

    /// Run one generation request and return the raw candidate set.
    async fn generate(&self, model: &str, prompt: &str) -> Result<GenerateResponse>;
}

/// Outcome of a generation call: zero or more candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// The first text part of the first candidate, if any.
    ///
    /// An empty candidate list and a candidate with no text both come back
    /// as `None`.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(Part::text))
    }
}

/// One generation candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Absent when the service returns e.g. a bare finish reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

/// Ordered list of parts making up a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part.
///
/// The service can answer in modalities other than text; anything that is
/// not plain text is carried opaquely and ignored by the answer path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

impl Part {
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Other(_) => None,
        }
    }
}
