//! Chunk and record types with page/source tracking

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key holding a chunk's position within its page or text
pub const CHUNK_INDEX_KEY: &str = "chunk";

/// A bounded segment of source text, the unit of embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk text
    pub text: String,
    /// Originating document (file name)
    pub source_id: String,
    /// Page within the source (0 for raw text)
    pub page: u32,
    /// Additional string metadata stored alongside the chunk
    #[serde(default)]
    pub extra_metadata: HashMap<String, String>,
}

impl DocumentChunk {
    /// Create a chunk without extra metadata
    pub fn new(text: impl Into<String>, source_id: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            page,
            extra_metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_metadata.insert(key.into(), value.into());
        self
    }

    /// Identifier used in batch reports: `source#page`, or `source#page#chunk`
    /// when the chunk carries its position
    pub fn label(&self) -> String {
        match self.extra_metadata.get(CHUNK_INDEX_KEY) {
            Some(index) => format!("{}#{}#{}", self.source_id, self.page, index),
            None => format!("{}#{}", self.source_id, self.page),
        }
    }

    /// SHA-256 of the chunk text, hex encoded
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }

    /// Stable point id derived from (source, page, text).
    ///
    /// Re-embedding identical content yields the same id, so stores overwrite
    /// the earlier record instead of duplicating it.
    pub fn point_id(&self) -> Uuid {
        let mut hasher = Sha256::new();
        hasher.update(self.source_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.page.to_le_bytes());
        hasher.update([0u8]);
        hasher.update(self.text.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes)
    }
}

/// A chunk together with its embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub chunk: DocumentChunk,
}

impl EmbeddingRecord {
    pub fn new(vector: Vec<f32>, chunk: DocumentChunk) -> Self {
        Self { vector, chunk }
    }
}

/// Raw file handed over by the upload layer
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Lowercased file extension, empty when there is none
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}
