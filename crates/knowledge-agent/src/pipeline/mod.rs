//! RAG pipeline operations on a provider handle
//!
//! Each operation is stateless apart from the vector store:
//! - `create_collection` / `delete`: manage the handle's own collection
//! - `embed_documents`: chunk, embed and store
//! - `search`: embed the query and run a similarity search
//! - `answer`: search, assemble a prompt, complete
//! - `explain`: answer, then attribute the answer to retrieved spans
//! - `summarize` / `complete`: single completion calls

mod answer;
mod collection;
mod embed;
mod explain;
mod search;

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

pub use collection::initialize_collections;

use crate::config::{ChunkingConfig, RagConfig};
use crate::error::Result;
use crate::providers::{CompletionOptions, ProviderHandle};

/// Pipeline parameters shared by every handle a selector builds
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub chunking: ChunkingConfig,
    /// Extra attempts for embedding and search calls
    pub read_retries: u32,
    /// Delay before the first retry, doubled on each further attempt
    pub retry_delay: Duration,
    pub completion: CompletionOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            read_retries: 0,
            retry_delay: Duration::from_millis(500),
            completion: CompletionOptions::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            chunking: config.chunking.clone(),
            read_retries: config.retrieval.read_retries,
            completion: CompletionOptions {
                max_tokens: config.retrieval.max_answer_tokens,
                temperature: config.retrieval.temperature,
            },
            ..Default::default()
        }
    }
}

impl ProviderHandle {
    /// Retry policy for embedding and search calls; writes and completions never retry
    pub(crate) async fn read_with_retry<F, Fut, T>(&self, what: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let settings = self.settings();
        retry_read(settings.read_retries, settings.retry_delay, what, operation).await
    }
}

/// Run an idempotent read, retrying retryable failures up to `retries` times
pub(crate) async fn retry_read<F, Fut, T>(
    retries: u32,
    delay: Duration,
    what: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < retries && e.is_retryable() => {
                let wait = delay.saturating_mul(2u32.saturating_pow(attempt));
                attempt += 1;
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    what,
                    attempt,
                    retries + 1,
                    wait,
                    e
                );
                sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}
