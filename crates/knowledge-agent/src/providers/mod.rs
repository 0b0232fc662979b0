//! Provider abstractions for embeddings, completions, attribution and vector storage
//!
//! Concrete backends implement the traits; `ProviderSelector` picks the set that
//! belongs to one provider and hands it out as a `ProviderHandle`.

pub mod aleph_alpha;
pub mod completion;
pub mod credentials;
pub mod embedding;
mod http;
pub mod openai;
pub mod selector;
pub mod vector_store;

pub use aleph_alpha::AlephAlphaClient;
pub use completion::{AttributionProvider, CompletionOptions, CompletionProvider, SpanAttribution};
pub use credentials::CredentialStore;
pub use embedding::EmbeddingProvider;
pub use openai::OpenAiCompatibleClient;
pub use selector::{ProviderHandle, ProviderSelector};
pub use vector_store::{MetadataFilter, UpsertFailure, UpsertReport, VectorStoreGateway};
