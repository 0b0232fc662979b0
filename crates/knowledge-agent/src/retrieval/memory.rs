//! In-process vector store
//!
//! Brute-force cosine search over each collection. Records keep their
//! insertion position, and overwriting a point leaves it in place, so equal
//! scores come back in the order the points were first inserted.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use super::cosine_similarity;
use crate::error::{Error, Result};
use crate::providers::{MetadataFilter, UpsertFailure, UpsertReport, VectorStoreGateway};
use crate::types::{EmbeddingRecord, SearchResult};

struct Collection {
    dimensions: usize,
    records: Vec<(Uuid, EmbeddingRecord)>,
}

/// Vector store held in memory, lost on restart
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, RwLock<Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> Result<usize> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        let len = entry.read().records.len();
        Ok(len)
    }
}

#[async_trait]
impl VectorStoreGateway for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.collections.entry(name.to_string()).or_insert_with(|| {
            tracing::info!("Created collection '{}' ({} dimensions)", name, dimensions);
            RwLock::new(Collection {
                dimensions,
                records: Vec::new(),
            })
        });
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<UpsertReport> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        let mut guard = entry.write();
        let mut report = UpsertReport::default();

        for record in records {
            let label = record.chunk.label();
            if record.vector.len() != guard.dimensions {
                report.failed.push(UpsertFailure {
                    item: label,
                    error: Error::DimensionMismatch {
                        collection: collection.to_string(),
                        expected: guard.dimensions,
                        actual: record.vector.len(),
                    },
                });
                continue;
            }

            let id = record.chunk.point_id();
            match guard.records.iter().position(|(existing, _)| *existing == id) {
                Some(index) => guard.records[index].1 = record.clone(),
                None => guard.records.push((id, record.clone())),
            }
            report.succeeded.push(label);
        }

        Ok(report)
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
        score_threshold: f32,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        let Some(entry) = self.collections.get(collection) else {
            tracing::debug!("Search in missing collection '{}'", collection);
            return Ok(Vec::new());
        };
        let guard = entry.read();

        if query_vector.len() != guard.dimensions {
            return Err(Error::DimensionMismatch {
                collection: collection.to_string(),
                expected: guard.dimensions,
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<(f32, &EmbeddingRecord)> = guard
            .records
            .iter()
            .filter(|(_, r)| filter.matches(&r.chunk.source_id, r.chunk.page))
            .map(|(_, r)| (cosine_similarity(query_vector, &r.vector), r))
            .filter(|(score, _)| *score > 0.0 && *score >= score_threshold)
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| SearchResult {
                text: record.chunk.text.clone(),
                page: record.chunk.page,
                source: record.chunk.source_id.clone(),
                score,
            })
            .collect())
    }

    async fn delete(&self, collection: &str, page: u32, source: &str) -> Result<usize> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        let mut guard = entry.write();
        let before = guard.records.len();
        guard
            .records
            .retain(|(_, r)| !(r.chunk.page == page && r.chunk.source_id == source));
        Ok(before - guard.records.len())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.contains_key(name))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
