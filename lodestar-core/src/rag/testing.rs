//! Test doubles for the provider and store seams.

use super::store::{Result as StoreResult, VectorStore};
use super::types::SearchResult;
use crate::provider::{
    Candidate, Content, GenerateResponse, Part, Provider, ProviderError, Result as ProviderResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Recording fake for the model service. Hands back constant vectors of a
/// fixed dimensionality and a canned generation response.
pub struct MockProvider {
    /// Batches passed to `embed_batch`, in call order
    pub embed_calls: Mutex<Vec<Vec<String>>>,
    /// The `dimension` argument of each embed call
    pub requested_dims: Mutex<Vec<Option<usize>>>,
    /// Prompts passed to `generate`
    pub prompts: Mutex<Vec<String>>,
    dimension: usize,
    fail_embed_call: Option<usize>,
    response: GenerateResponse,
}

impl MockProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            embed_calls: Mutex::new(Vec::new()),
            requested_dims: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            dimension,
            fail_embed_call: None,
            response: GenerateResponse::default(),
        }
    }

    /// The nth embed call (zero-based) fails with an API error.
    pub fn failing_embed_call(mut self, call: usize) -> Self {
        self.fail_embed_call = Some(call);
        self
    }

    /// `generate` answers with a single text part.
    pub fn with_text_response(mut self, text: &str) -> Self {
        self.response = GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![Part::Text {
                        text: text.to_string(),
                    }],
                }),
            }],
        };
        self
    }

    pub fn embed_call_count(&self) -> usize {
        self.embed_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn embed_batch(
        &self,
        _model: &str,
        texts: &[String],
        dimension: Option<usize>,
    ) -> ProviderResult<Vec<Vec<f32>>> {
        let call = {
            let mut calls = self.embed_calls.lock().unwrap();
            calls.push(texts.to_vec());
            calls.len() - 1
        };
        self.requested_dims.lock().unwrap().push(dimension);

        if self.fail_embed_call == Some(call) {
            return Err(ProviderError::Api {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            });
        }

        Ok(texts.iter().map(|_| vec![0.1; self.dimension]).collect())
    }

    async fn generate(&self, _model: &str, prompt: &str) -> ProviderResult<GenerateResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// What one `upsert` call received.
pub struct UpsertCall {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadatas: Vec<HashMap<String, String>>,
}

/// Recording fake for the vector store.
pub struct MockStore {
    pub upserts: Mutex<Vec<UpsertCall>>,
    /// `(embedding, top_k)` per query call
    pub queries: Mutex<Vec<(Vec<f32>, usize)>>,
    results: Vec<SearchResult>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::with_results(Vec::new())
    }

    /// Queries answer with up to `top_k` of these results.
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            upserts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            results,
        }
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorStore for MockStore {
    async fn ensure_collection(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
        metadatas: &[HashMap<String, String>],
    ) -> StoreResult<()> {
        self.upserts.lock().unwrap().push(UpsertCall {
            ids: ids.to_vec(),
            documents: documents.to_vec(),
            embeddings: embeddings.to_vec(),
            metadatas: metadatas.to_vec(),
        });
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> StoreResult<Vec<SearchResult>> {
        self.queries.lock().unwrap().push((embedding.to_vec(), top_k));
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

/// A retrieved chunk with `source` metadata, unless `source` is empty.
pub fn hit(text: &str, source: &str, distance: f32) -> SearchResult {
    let mut metadata = HashMap::new();
    if !source.is_empty() {
        metadata.insert("source".to_string(), source.to_string());
    }
    SearchResult {
        text: text.to_string(),
        metadata,
        distance,
    }
}
