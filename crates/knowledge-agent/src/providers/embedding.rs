//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `AlephAlphaClient`: luminous semantic embeddings
/// - `OpenAiCompatibleClient`: OpenAI and the GPT4All local server
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a document chunk
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a search query.
    ///
    /// Providers with asymmetric embeddings override this; the default treats
    /// queries like documents.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text).await
    }

    /// Embed several texts, stopping at the first failure
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Vector length produced by this provider
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
