//! Chroma vector store implementation.
//!
//! Plain-JSON HTTP client for a Chroma server. The server's API has gone
//! through several wire generations; this client speaks all of them
//! through the adapter selected in [`StoreConfig`], with identical
//! semantics on top.

use super::store::{Result, StoreError, VectorStore};
use super::types::SearchResult;
use crate::config::{StoreConfig, WireFormat};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Metric fixed at collection creation; distances in query results are
/// cosine distances, lower is closer.
const SIMILARITY_METRIC: &str = "cosine";

/// Chroma HTTP gateway to one collection.
pub struct ChromaStore {
    http_client: reqwest::Client,
    host: String,
    collection: String,
    tenant: String,
    database: String,
    wire: WireFormat,
}

impl ChromaStore {
    /// Creates a new Chroma client with the specified config.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            host: config.host.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            wire: config.wire_format,
        })
    }

    /// Path prefix up to and including `/collections`.
    fn collections_root(&self) -> String {
        match self.wire {
            WireFormat::V1Records | WireFormat::V1Arrays => {
                format!("{}/api/v1/collections", self.host)
            }
            WireFormat::V2 => format!(
                "{}/api/v2/tenants/{}/databases/{}/collections",
                self.host, self.tenant, self.database
            ),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.collections_root(), self.collection)
    }

    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StoreError::Api { status, body }
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn ensure_collection(&self) -> Result<()> {
        let response = self.http_client.get(self.collection_url()).send().await?;
        match response.status() {
            StatusCode::OK => {
                debug!(collection = %self.collection, "collection already exists");
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            _ => return Err(Self::api_error(response).await),
        }

        let body = CreateCollectionBody {
            name: &self.collection,
            metadata: CollectionMetadata {
                space: SIMILARITY_METRIC,
            },
        };
        let response = self
            .http_client
            .post(self.collections_root())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(Self::api_error(response).await);
        }

        info!(collection = %self.collection, "collection created");
        Ok(())
    }

    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
        metadatas: &[HashMap<String, String>],
    ) -> Result<()> {
        if ids.len() != documents.len() || ids.len() != embeddings.len() {
            return Err(StoreError::Validation {
                ids: ids.len(),
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }

        let url = format!("{}/upsert", self.collection_url());
        debug!(records = ids.len(), "upserting batch");

        let metas: Vec<Option<&HashMap<String, String>>> = (0..ids.len())
            .map(|i| metadatas.get(i).filter(|m| !m.is_empty()))
            .collect();

        let response = match self.wire {
            WireFormat::V1Records => {
                let mut records = Vec::with_capacity(ids.len());
                for i in 0..ids.len() {
                    records.push(UpsertRecord {
                        id: &ids[i],
                        document: &documents[i],
                        embedding: &embeddings[i],
                        metadata: metas[i],
                    });
                }
                self.http_client
                    .post(&url)
                    .json(&RecordsUpsertBody { records })
                    .send()
                    .await?
            }
            WireFormat::V1Arrays | WireFormat::V2 => {
                let body = ArraysUpsertBody {
                    ids,
                    documents,
                    embeddings,
                    metadatas: if metas.iter().all(Option::is_none) {
                        None
                    } else {
                        Some(metas)
                    },
                };
                self.http_client.post(&url).json(&body).send().await?
            }
        };

        if response.status() != StatusCode::OK {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let url = format!("{}/query", self.collection_url());
        let body = QueryBody {
            query_embeddings: vec![embedding],
            n_results: top_k,
            include: INCLUDE_FIELDS,
        };

        let response = self.http_client.post(&url).json(&body).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Self::api_error(response).await);
        }

        let query_response = response.json::<QueryResponse>().await?;
        let results = query_response.into_results();
        debug!(results = results.len(), top_k, "query finished");
        Ok(results)
    }
}

// Chroma-specific request/response types (internal)

const INCLUDE_FIELDS: [&str; 4] = ["documents", "metadatas", "distances", "ids"];

#[derive(Debug, Serialize)]
struct CreateCollectionBody<'a> {
    name: &'a str,
    metadata: CollectionMetadata,
}

#[derive(Debug, Serialize)]
struct CollectionMetadata {
    #[serde(rename = "hnsw:space")]
    space: &'static str,
}

#[derive(Debug, Serialize)]
struct RecordsUpsertBody<'a> {
    records: Vec<UpsertRecord<'a>>,
}

#[derive(Debug, Serialize)]
struct UpsertRecord<'a> {
    id: &'a str,
    document: &'a str,
    embedding: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct ArraysUpsertBody<'a> {
    ids: &'a [String],
    documents: &'a [String],
    embeddings: &'a [Vec<f32>],
    /// Per-record placeholders; `None` entries serialize as JSON null
    #[serde(skip_serializing_if = "Option::is_none")]
    metadatas: Option<Vec<Option<&'a HashMap<String, String>>>>,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: [&'static str; 4],
}

/// Response arrays are per-query; one embedding is sent per call, so only
/// the first element of each outer array is consumed.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<HashMap<String, String>>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

impl QueryResponse {
    fn into_results(self) -> Vec<SearchResult> {
        let documents = self.documents.into_iter().next().unwrap_or_default();
        let mut metadatas = self
            .metadatas
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();
        let mut distances = self
            .distances
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();

        documents
            .into_iter()
            .map(|text| SearchResult {
                text,
                metadata: metadatas.next().flatten().unwrap_or_default(),
                distance: distances.next().unwrap_or_default(),
            })
            .collect()
    }
}
