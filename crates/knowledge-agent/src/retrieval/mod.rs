//! Vector store gateways

mod memory;
mod qdrant;

use std::sync::Arc;

pub use memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

use crate::config::{VectorBackend, VectorDbConfig};
use crate::error::Result;
use crate::providers::VectorStoreGateway;

/// Build the configured vector store
pub fn create_vector_store(config: &VectorDbConfig) -> Result<Arc<dyn VectorStoreGateway>> {
    let store: Arc<dyn VectorStoreGateway> = match config.backend {
        VectorBackend::Memory => Arc::new(InMemoryVectorStore::new()),
        VectorBackend::Qdrant => Arc::new(QdrantVectorStore::new(config)?),
    };
    tracing::info!("Using {} vector store", store.name());
    Ok(store)
}

/// Cosine similarity; zero vectors score 0
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
