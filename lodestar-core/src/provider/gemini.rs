//! Gemini provider implementation.
//!
//! This module provides a client for the generative-language REST API that
//! implements the Provider trait: `batchEmbedContents` for embeddings and
//! `generateContent` for answers.

use super::types::*;
use crate::config::ProviderConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini REST API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the specified config.
    ///
    /// The configured timeout applies to every outbound call.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn embed_batch(
        &self,
        model: &str,
        texts: &[String],
        dimension: Option<usize>,
    ) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1beta/models/{}:batchEmbedContents", self.base_url, model);
        debug!(texts = texts.len(), model, "requesting embeddings");

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{model}"),
                    content: ContentBody {
                        parts: vec![Part::Text { text: text.clone() }],
                    },
                    output_dimensionality: dimension,
                })
                .collect(),
        };

        let response = self.post(&url, &request).await?;
        let embed_response = response.json::<BatchEmbedResponse>().await?;

        Ok(embed_response
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<GenerateResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        debug!(model, "requesting generation");

        let request = GenerateRequest {
            contents: vec![ContentBody {
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.post(&url, &request).await?;
        Ok(response.json::<GenerateResponse>().await?)
    }
}

// Gemini-specific request/response types (internal)

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: ContentBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ContentBody {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<ContentBody>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_request_wire_shape() {
        let request = BatchEmbedRequest {
            requests: vec![EmbedContentRequest {
                model: "models/gemini-embedding-001".to_string(),
                content: ContentBody {
                    parts: vec![Part::Text {
                        text: "hello".to_string(),
                    }],
                },
                output_dimensionality: Some(3072),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "requests": [{
                    "model": "models/gemini-embedding-001",
                    "content": {"parts": [{"text": "hello"}]},
                    "outputDimensionality": 3072
                }]
            })
        );
    }

    #[test]
    fn test_unset_dimension_is_left_out() {
        let request = EmbedContentRequest {
            model: "models/gemini-embedding-001".to_string(),
            content: ContentBody { parts: vec![] },
            output_dimensionality: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("outputDimensionality").is_none());
    }

    #[test]
    fn test_embed_response_decodes_values_in_order() {
        let response: BatchEmbedResponse = serde_json::from_str(
            r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#,
        )
        .unwrap();

        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[0].values, vec![0.1, 0.2]);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn test_generate_request_wire_shape() {
        let request = GenerateRequest {
            contents: vec![ContentBody {
                parts: vec![Part::Text {
                    text: "a question".to_string(),
                }],
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [{"parts": [{"text": "a question"}]}]
            })
        );
    }
}
