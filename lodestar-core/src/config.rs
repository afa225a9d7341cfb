use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the entire pipeline.
///
/// Built once at startup and handed to constructors; components never read
/// files or the environment themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Connection settings for the generative-language service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; when empty, [`Config::with_env_api_key`] fills it from
    /// `GEMINI_API_KEY` or `GOOGLE_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

/// Connection settings for the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_host")]
    pub host: String,
    /// Collection the chunks live in
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub wire_format: WireFormat,
    /// Only used by the v2 wire format
    #[serde(default = "default_tenant")]
    pub tenant: String,
    /// Only used by the v2 wire format
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

/// Wire dialect spoken to the store. The server has gone through several
/// generations of its HTTP API; each one is a selectable adapter rather
/// than a separate client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// Flat `/api/v1` paths, `{records: [...]}` upsert bodies (default)
    V1Records,
    /// Flat `/api/v1` paths, parallel-array upsert bodies
    V1Arrays,
    /// Tenant/database-scoped `/api/v2` paths, parallel-array bodies
    V2,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self::V1Records
    }
}

/// Chunking and write-path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Words per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Words shared between neighboring chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Texts grouped into one embedding call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Embedding dimensionality; 0 lets the service pick its default
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Query-path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    120
}

fn default_store_host() -> String {
    "http://localhost:8000".to_string()
}

fn default_collection() -> String {
    "lodestar".to_string()
}

fn default_tenant() -> String {
    "default_tenant".to_string()
}

fn default_database() -> String {
    "default_database".to_string()
}

fn default_store_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    200
}

fn default_chunk_overlap() -> usize {
    20
}

fn default_batch_size() -> usize {
    64
}

fn default_dimension() -> usize {
    3072
}

fn default_top_k() -> usize {
    5
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_provider_base_url(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            collection: default_collection(),
            wire_format: WireFormat::default(),
            tenant: default_tenant(),
            database: default_database(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            dimension: default_dimension(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;

        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_default()
    }

    /// Fill an empty API key from `GEMINI_API_KEY` or `GOOGLE_API_KEY`.
    ///
    /// Called once at startup; nothing downstream touches the environment.
    pub fn with_env_api_key(mut self) -> Self {
        if self.provider.api_key.is_empty() {
            for var in ["GEMINI_API_KEY", "GOOGLE_API_KEY"] {
                if let Ok(key) = std::env::var(var) {
                    if !key.is_empty() {
                        self.provider.api_key = key;
                        break;
                    }
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.embedding_model, "gemini-embedding-001");
        assert_eq!(config.generation_model, "gemini-2.5-pro");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "http://localhost:8000");
        assert_eq!(config.collection, "lodestar");
        assert_eq!(config.wire_format, WireFormat::V1Records);
        assert_eq!(config.tenant, "default_tenant");
        assert_eq!(config.database, "default_database");
    }

    #[test]
    fn test_ingest_config_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.chunk_overlap, 20);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.dimension, 3072);
    }

    #[test]
    fn test_empty_yaml_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str("provider: {}").unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.store.collection, "lodestar");
        assert_eq!(config.provider.embedding_model, "gemini-embedding-001");
    }

    #[test]
    fn test_yaml_overrides_take_precedence() {
        let yaml = r#"
store:
  host: http://chroma:9000
  collection: notes
  wire_format: v1-arrays
ingest:
  chunk_size: 50
  chunk_overlap: 5
retrieval:
  top_k: 3
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.host, "http://chroma:9000");
        assert_eq!(config.store.collection, "notes");
        assert_eq!(config.store.wire_format, WireFormat::V1Arrays);
        assert_eq!(config.ingest.chunk_size, 50);
        assert_eq!(config.ingest.chunk_overlap, 5);
        assert_eq!(config.retrieval.top_k, 3);
        // untouched sections keep their defaults
        assert_eq!(config.ingest.batch_size, 64);
    }

    #[test]
    fn test_wire_format_names() {
        assert_eq!(
            serde_yaml::from_str::<WireFormat>("v1-records").unwrap(),
            WireFormat::V1Records
        );
        assert_eq!(
            serde_yaml::from_str::<WireFormat>("v2").unwrap(),
            WireFormat::V2
        );
        assert_eq!(
            serde_yaml::to_string(&WireFormat::V1Arrays).unwrap().trim(),
            "v1-arrays"
        );
    }

    #[test]
    fn test_env_api_key_applies_only_when_unset() {
        std::env::set_var("GEMINI_API_KEY", "from-env");

        let config = Config::default().with_env_api_key();
        assert_eq!(config.provider.api_key, "from-env");

        let mut config = Config::default();
        config.provider.api_key = "from-file".to_string();
        let config = config.with_env_api_key();
        assert_eq!(config.provider.api_key, "from-file");

        std::env::remove_var("GEMINI_API_KEY");
    }
}
