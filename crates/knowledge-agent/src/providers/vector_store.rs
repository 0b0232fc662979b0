//! Vector store gateway trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{EmbeddingRecord, SearchResult};

/// Filter on indexed metadata fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub source: Option<String>,
    pub page: Option<u32>,
}

impl MetadataFilter {
    /// Match a single source
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            page: None,
        }
    }

    /// Whether the filter accepts a record with this source and page
    pub fn matches(&self, source: &str, page: u32) -> bool {
        self.source.as_deref().map_or(true, |s| s == source)
            && self.page.map_or(true, |p| p == page)
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.page.is_none()
    }
}

/// A record the store did not commit
#[derive(Debug)]
pub struct UpsertFailure {
    /// Chunk label (`source#page#chunk`)
    pub item: String,
    pub error: Error,
}

/// Per-record outcome of an upsert batch
#[derive(Debug, Default)]
pub struct UpsertReport {
    /// Labels of committed records, in input order
    pub succeeded: Vec<String>,
    pub failed: Vec<UpsertFailure>,
}

impl UpsertReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Trait for vector storage and similarity search.
///
/// Collections are scoped to one provider binding; vectors from different
/// embedding models are never mixed in one collection.
///
/// Implementations:
/// - `InMemoryVectorStore`: in-process store with cosine similarity
/// - `QdrantVectorStore`: Qdrant REST API
#[async_trait]
pub trait VectorStoreGateway: Send + Sync {
    /// Create a collection; no-op when it already exists
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Insert or overwrite records.
    ///
    /// Each record is written atomically; the batch is not. Records whose
    /// vector length differs from the collection fail with `DimensionMismatch`
    /// and are listed in the report.
    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<UpsertReport>;

    /// Up to `top_k` results with score above zero and at least `score_threshold`,
    /// best first, ties in insertion order. A collection that does not exist
    /// yields no results.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
        score_threshold: f32,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>>;

    /// Delete every record whose page and source both match; returns the count
    async fn delete(&self, collection: &str, page: u32, source: &str) -> Result<usize>;

    /// Whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        let any = MetadataFilter::default();
        assert!(any.is_empty());
        assert!(any.matches("doc.pdf", 1));

        let by_source = MetadataFilter::source("doc.pdf");
        assert!(by_source.matches("doc.pdf", 7));
        assert!(!by_source.matches("other.pdf", 7));

        let exact = MetadataFilter {
            source: Some("doc.pdf".into()),
            page: Some(3),
        };
        assert!(exact.matches("doc.pdf", 3));
        assert!(!exact.matches("doc.pdf", 4));
    }
}
