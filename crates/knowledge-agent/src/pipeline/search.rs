//! Semantic search

use crate::error::{Error, Result};
use crate::providers::ProviderHandle;
use crate::types::{Filtering, SearchResult};

impl ProviderHandle {
    /// Embed the query and return the closest chunks of this binding's
    /// collection, best first.
    ///
    /// A search that races `embed_documents` may or may not see the records
    /// being written.
    pub async fn search(&self, query: &str, filtering: &Filtering) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::MissingQuery);
        }

        let vector = self
            .read_with_retry("query embedding", || self.embedder().embed_query(query))
            .await?;

        let filter = filtering.metadata_filter();
        let vector = vector.as_slice();
        let filter_ref = &filter;
        let results = self
            .read_with_retry("search", move || {
                self.store().search(
                    self.collection(),
                    vector,
                    filtering.top_k,
                    filtering.score_threshold,
                    filter_ref,
                )
            })
            .await?;

        if results.is_empty() {
            tracing::info!("No documents found in '{}'", self.collection());
        } else {
            tracing::info!("Found {} documents in '{}'", results.len(), self.collection());
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::VectorStoreGateway;
    use crate::retrieval::InMemoryVectorStore;
    use crate::test_support::{fake_handle, retrying_handle, HashEmbedder, ScriptedLlm};
    use crate::types::{DocumentChunk, EmbedInput, LlmProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_filtered_round_trip() {
        let store = Arc::new(InMemoryVectorStore::new());
        let handle = fake_handle(
            LlmProvider::OpenAi,
            store,
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedLlm::new("ok")),
        );
        handle.create_collection().await.unwrap();
        handle
            .embed_documents(EmbedInput::Chunks(vec![
                DocumentChunk::new("Quarterly revenue grew", "doc.pdf", 3),
                DocumentChunk::new("Quarterly revenue grew", "other.pdf", 3),
                DocumentChunk::new("Quarterly revenue grew", "doc.pdf", 4),
            ]))
            .await
            .unwrap();

        let filtering = Filtering::default().with_source("doc.pdf").with_page(3);
        let results = handle.search("revenue", &filtering).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "Quarterly revenue grew");
        assert_eq!(results[0].source, "doc.pdf");
        assert_eq!(results[0].page, 3);
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_blank_query() {
        let embedder = Arc::new(HashEmbedder::new());
        let handle = fake_handle(
            LlmProvider::Gpt4All,
            Arc::new(InMemoryVectorStore::new()),
            embedder.clone(),
            Arc::new(ScriptedLlm::new("ok")),
        );

        let err = handle.search("  ", &Filtering::default()).await.unwrap_err();
        assert!(matches!(err, Error::MissingQuery));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_collection_is_not_an_error() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection("openai", 32).await.unwrap();
        let handle = fake_handle(
            LlmProvider::OpenAi,
            store,
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedLlm::new("ok")),
        );

        let results = handle.search("anything", &Filtering::default()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_read_retries_are_opt_in() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection("openai", 32).await.unwrap();

        let flaky = Arc::new(HashEmbedder::new().timing_out(1));
        let handle = retrying_handle(store.clone(), flaky.clone(), Arc::new(ScriptedLlm::new("ok")), 0);
        let err = handle.search("sky", &Filtering::default()).await.unwrap_err();
        assert!(err.is_retryable());

        let flaky = Arc::new(HashEmbedder::new().timing_out(1));
        let handle = retrying_handle(store, flaky.clone(), Arc::new(ScriptedLlm::new("ok")), 1);
        assert!(handle.search("sky", &Filtering::default()).await.is_ok());
        assert_eq!(flaky.calls(), 2);
    }
}
