//! Collection management

use crate::error::Result;
use crate::providers::{ProviderHandle, ProviderSelector};
use crate::types::LlmProvider;

impl ProviderHandle {
    /// Create this binding's collection sized for its embedding model.
    ///
    /// Calling it again for an existing collection is a no-op.
    pub async fn create_collection(&self) -> Result<()> {
        self.store()
            .create_collection(self.collection(), self.embedder().dimensions())
            .await
    }

    /// Delete every record in this binding's collection with the given page
    /// and source; returns how many were removed
    pub async fn delete(&self, page: u32, source: &str) -> Result<usize> {
        let deleted = self.store().delete(self.collection(), page, source).await?;
        tracing::info!(
            "Deleted {} records for {}#{} from '{}'",
            deleted,
            source,
            page,
            self.collection()
        );
        Ok(deleted)
    }
}

/// Create the default collection of every provider.
///
/// Runs once at start-up and needs no credentials; dimensions come from the
/// configuration. Returns the collection names.
pub async fn initialize_collections(selector: &ProviderSelector) -> Result<Vec<String>> {
    let mut created = Vec::with_capacity(LlmProvider::ALL.len());
    for provider in LlmProvider::ALL {
        let name = provider.default_collection();
        let dimensions = selector.config().dimensions_for(provider);
        selector.store().create_collection(name, dimensions).await?;
        created.push(name.to_string());
    }
    tracing::info!("Initialized collections: {}", created.join(", "));
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::providers::VectorStoreGateway;
    use crate::retrieval::InMemoryVectorStore;
    use crate::test_support::{fake_handle, HashEmbedder, ScriptedLlm};
    use crate::types::{DocumentChunk, EmbedInput, Filtering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_collection_twice() {
        let store = Arc::new(InMemoryVectorStore::new());
        let handle = fake_handle(
            LlmProvider::OpenAi,
            store.clone(),
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedLlm::new("ok")),
        );

        handle.create_collection().await.unwrap();
        handle
            .embed_documents(EmbedInput::Chunks(vec![DocumentChunk::new("kept", "a.txt", 1)]))
            .await
            .unwrap();
        handle.create_collection().await.unwrap();

        assert_eq!(store.len("openai").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_page_and_source() {
        let store = Arc::new(InMemoryVectorStore::new());
        let handle = fake_handle(
            LlmProvider::AlephAlpha,
            store.clone(),
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedLlm::new("ok")),
        );
        handle.create_collection().await.unwrap();
        handle
            .embed_documents(EmbedInput::Chunks(vec![
                DocumentChunk::new("Invoices are due in thirty days", "doc.pdf", 3),
                DocumentChunk::new("Late invoices cost a fee", "doc.pdf", 3),
                DocumentChunk::new("Invoices are sent by mail", "doc.pdf", 4),
            ]))
            .await
            .unwrap();

        let filtering = Filtering::default().with_source("doc.pdf").with_page(3);
        assert_eq!(handle.search("invoices", &filtering).await.unwrap().len(), 2);

        assert_eq!(handle.delete(3, "doc.pdf").await.unwrap(), 2);
        assert!(handle.search("invoices", &filtering).await.unwrap().is_empty());
        assert_eq!(handle.delete(3, "doc.pdf").await.unwrap(), 0);
        assert_eq!(store.len("aleph-alpha").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_initialize_collections() {
        let store = Arc::new(InMemoryVectorStore::new());
        let selector = ProviderSelector::new(RagConfig::default(), store.clone());

        let created = initialize_collections(&selector).await.unwrap();
        assert_eq!(created, vec!["aleph-alpha", "openai", "gpt4all"]);
        for name in &created {
            assert!(store.collection_exists(name).await.unwrap());
        }

        // Existing collections are left alone
        initialize_collections(&selector).await.unwrap();
    }
}
