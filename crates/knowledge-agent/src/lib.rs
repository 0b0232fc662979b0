//! knowledge-agent: chat with your documents across LLM providers
//!
//! A provider is selected per request (Aleph Alpha, OpenAI or a local GPT4All
//! server). The resulting `ProviderHandle` embeds documents into the provider's
//! own vector collection, runs semantic search, answers questions grounded on
//! the retrieved chunks and, where the provider supports it, attributes the
//! answer to the supporting spans.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::initialize_collections;
pub use providers::{ProviderHandle, ProviderSelector};
pub use types::{
    EmbedInput, ExplainRequest, Explanation, Filtering, LlmProvider, RagAnswer, RagRequest,
    SearchResult,
};
