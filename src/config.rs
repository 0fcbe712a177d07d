use crate::hierarchy::HeadingProfile;
use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the zoning-qa pipeline.
///
/// Loaded once in `main` and passed by reference into each component at
/// construction. There is no process-wide configuration singleton.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores chunk records.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for document storage.
    pub collection: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// API key for the Google Generative Language endpoints.
    pub google_api_key: Option<String>,
    /// API key for the Jina embeddings endpoint.
    pub jina_api_key: Option<String>,
    /// OpenAI-compatible chat completions base URL used for decomposition and answers.
    pub chat_base_url: String,
    /// Chat model identifier.
    pub chat_model: String,
    /// Optional override for the automatic chunk size selection (tokens).
    pub chunk_size: Option<usize>,
    /// Sliding token overlap between adjacent chunks.
    pub chunk_overlap: usize,
    /// Number of hits requested per query variant.
    pub search_top_k: usize,
    /// Number of records sent per upsert request.
    pub upsert_batch_size: usize,
    /// Optional heading code prefix identifying the document family (e.g. `150.7`).
    pub heading_code_prefix: Option<String>,
}

/// Supported embedding backends for the indexing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Hosted Gemini `embedContent` API.
    Gemini,
    /// Hosted Jina embeddings API.
    Jina,
    /// Deterministic local embedder, useful offline and in tests.
    Local,
}

const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
const DEFAULT_COLLECTION: &str = "bylaw_chunks";
const DEFAULT_CHAT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_SEARCH_TOP_K: usize = 3;
const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let embedding_provider: EmbeddingProvider = load_env_optional("EMBEDDING_PROVIDER")
            .map(|value| {
                value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))
            })
            .transpose()?
            .unwrap_or(EmbeddingProvider::Gemini);

        let config = Self {
            qdrant_url: load_env_or("QDRANT_URL", DEFAULT_QDRANT_URL),
            collection: load_env_or("QDRANT_COLLECTION_NAME", DEFAULT_COLLECTION),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            embedding_provider,
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| embedding_provider.default_model().to_string()),
            embedding_dimension: parse_env_or("EMBEDDING_DIMENSION", 768)?,
            google_api_key: load_env_optional("GOOGLE_API_KEY"),
            jina_api_key: load_env_optional("JINA_API_KEY"),
            chat_base_url: load_env_or("CHAT_BASE_URL", DEFAULT_CHAT_BASE_URL),
            chat_model: load_env_or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            chunk_size: load_env_optional("TEXT_SPLITTER_CHUNK_SIZE")
                .map(|value| {
                    value.parse().map_err(|_| {
                        ConfigError::InvalidValue("TEXT_SPLITTER_CHUNK_SIZE".to_string())
                    })
                })
                .transpose()?,
            chunk_overlap: parse_env_or("TEXT_SPLITTER_CHUNK_OVERLAP", 0)?,
            search_top_k: parse_env_or("SEARCH_TOP_K", DEFAULT_SEARCH_TOP_K)?,
            upsert_batch_size: parse_env_or("UPSERT_BATCH_SIZE", DEFAULT_UPSERT_BATCH_SIZE)?,
            heading_code_prefix: load_env_optional("HEADING_CODE_PREFIX"),
        };

        tracing::debug!(
            qdrant_url = %config.qdrant_url,
            collection = %config.collection,
            embedding_provider = ?config.embedding_provider,
            model = %config.embedding_model,
            dimension = config.embedding_dimension,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Build the heading profile for the configured document family.
    pub fn heading_profile(&self) -> HeadingProfile {
        match self.heading_code_prefix.as_deref() {
            Some(prefix) => HeadingProfile::with_code_prefix(prefix),
            None => HeadingProfile::generic(),
        }
    }

    /// Retrieve the Google API key, failing fast when it is absent.
    pub fn require_google_api_key(&self) -> Result<&str, ConfigError> {
        self.google_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVariable("GOOGLE_API_KEY".to_string()))
    }

    /// Retrieve the Jina API key, failing fast when it is absent.
    pub fn require_jina_api_key(&self) -> Result<&str, ConfigError> {
        self.jina_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVariable("JINA_API_KEY".to_string()))
    }
}

impl EmbeddingProvider {
    fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "text-embedding-004",
            Self::Jina => "jina-embeddings-v3",
            Self::Local => "local-hash",
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "jina" => Ok(Self::Jina),
            "local" => Ok(Self::Local),
            _ => Err(()),
        }
    }
}
