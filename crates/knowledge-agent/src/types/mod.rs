//! Core types for the knowledge agent

pub mod document;
pub mod provider;
pub mod query;
pub mod response;

pub use document::{DocumentChunk, EmbeddingRecord, UploadedFile, CHUNK_INDEX_KEY};
pub use provider::LlmProvider;
pub use query::{EmbedInput, ExplainRequest, Filtering, RagRequest};
pub use response::{
    AttributedSpan, Completion, EmbeddingSummary, Explanation, RagAnswer, SearchResult,
};
