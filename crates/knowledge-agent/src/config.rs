//! Configuration for the knowledge agent

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::LlmProvider;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Aleph Alpha configuration
    pub aleph_alpha: AlephAlphaConfig,
    /// OpenAI configuration
    pub openai: OpenAiConfig,
    /// GPT4All local server configuration
    pub gpt4all: Gpt4AllConfig,
    /// Fallback API tokens
    pub credentials: CredentialsConfig,
}

impl RagConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Override values from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override values from an arbitrary lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ALEPH_ALPHA_API_KEY") {
            self.credentials.aleph_alpha_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.credentials.openai_api_key = Some(key);
        }
        if let Some(url) = get("QDRANT_URL") {
            self.vector_db.backend = VectorBackend::Qdrant;
            self.vector_db.url = url;
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            self.vector_db.api_key = Some(key);
        }
        if let Some(host) = get("KNOWLEDGE_AGENT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("KNOWLEDGE_AGENT_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid KNOWLEDGE_AGENT_PORT: {}", port),
            }
        }
    }

    /// Embedding dimensions of a provider's collection
    pub fn dimensions_for(&self, provider: LlmProvider) -> usize {
        match provider {
            LlmProvider::AlephAlpha => self.aleph_alpha.dimensions,
            LlmProvider::OpenAi => self.openai.dimensions,
            LlmProvider::Gpt4All => self.gpt4all.dimensions,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024,
        }
    }
}

/// Which vector database backs the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// In-process store, lost on restart
    #[default]
    Memory,
    /// Qdrant over its REST API
    Qdrant,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    pub backend: VectorBackend,
    /// Qdrant base URL
    pub url: String,
    /// Qdrant API key (Qdrant Cloud)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            url: "http://localhost:6333".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Text chunking configuration for file input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
            min_chunk_size: 1,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Extra attempts for embedding and search calls (reads only, default: 0)
    pub read_retries: u32,
    /// Maximum tokens for generated answers
    pub max_answer_tokens: u32,
    /// Sampling temperature for answers
    pub temperature: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            read_retries: 0,
            max_answer_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// Aleph Alpha configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlephAlphaConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    /// Compressed semantic embedding size (128 or 5120)
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for AlephAlphaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.aleph-alpha.com".to_string(),
            embedding_model: "luminous-base".to_string(),
            completion_model: "luminous-extended-control".to_string(),
            dimensions: 128,
            timeout_secs: 120,
        }
    }
}

/// OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            completion_model: "gpt-3.5-turbo".to_string(),
            dimensions: 1536,
            timeout_secs: 120,
        }
    }
}

/// GPT4All local server configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Gpt4AllConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for Gpt4AllConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4891/v1".to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            completion_model: "orca-mini-3b-gguf2-q4_0.gguf".to_string(),
            dimensions: 384,
            timeout_secs: 300,
        }
    }
}

/// Fallback tokens used when a request does not carry one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub aleph_alpha_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}
