//! Request types for search, RAG and explanation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::document::{DocumentChunk, UploadedFile};
use crate::providers::vector_store::MetadataFilter;

/// Retrieval parameters shared by search, answer and explain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filtering {
    /// Number of results to retrieve (default: 3)
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score, inclusive (default: 0.0)
    #[serde(default)]
    pub score_threshold: f32,

    /// Only return chunks from this source
    #[serde(default)]
    pub source: Option<String>,

    /// Only return chunks from this page
    #[serde(default)]
    pub page: Option<u32>,
}

fn default_top_k() -> usize {
    3
}

impl Default for Filtering {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: 0.0,
            source: None,
            page: None,
        }
    }
}

impl Filtering {
    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Restrict to one source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Restrict to one page
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the minimum score
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Metadata part of the filter, passed to the vector store
    pub fn metadata_filter(&self) -> MetadataFilter {
        MetadataFilter {
            source: self.source.clone(),
            page: self.page,
        }
    }
}

/// Question answering request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagRequest {
    /// The question; absent or blank queries are rejected
    #[serde(default)]
    pub query: Option<String>,

    /// Previous conversation turns, summarized before retrieval
    #[serde(default)]
    pub history: Vec<String>,

    /// Retrieval parameters
    #[serde(default)]
    pub filtering: Filtering,
}

impl RagRequest {
    /// Create a request for a question
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Attach conversation history
    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    /// Set retrieval parameters
    pub fn with_filtering(mut self, filtering: Filtering) -> Self {
        self.filtering = filtering;
        self
    }

    /// The query if present and not blank
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Question answering with span attribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    /// Underlying RAG request
    pub rag_request: RagRequest,

    /// Minimum attribution score for a span to be kept, inclusive (default: 0.7)
    #[serde(default = "default_explain_threshold")]
    pub explain_threshold: f32,

    /// How many of the top search results are explained (default: 1)
    #[serde(default = "default_explain_documents")]
    pub explain_documents: usize,
}

fn default_explain_threshold() -> f32 {
    0.7
}

fn default_explain_documents() -> usize {
    1
}

impl ExplainRequest {
    pub fn new(rag_request: RagRequest, explain_threshold: f32) -> Self {
        Self {
            rag_request,
            explain_threshold,
            explain_documents: default_explain_documents(),
        }
    }

    /// Explain more than the top document
    pub fn with_documents(mut self, count: usize) -> Self {
        self.explain_documents = count;
        self
    }
}

/// Input accepted by `embed_documents`
#[derive(Debug, Clone)]
pub enum EmbedInput {
    /// Chunks prepared by the caller
    Chunks(Vec<DocumentChunk>),
    /// Raw text split on a separator
    Text {
        text: String,
        file_name: String,
        separator: String,
    },
    /// Uploaded files, chunked per page
    Files(Vec<UploadedFile>),
    /// Every file with the given extension below a folder
    Folder { path: PathBuf, file_ending: String },
}
