//! Result types returned by the pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One similarity search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub page: u32,
    pub source: String,
    /// Similarity score, higher is more relevant. Scale depends on the provider.
    pub score: f32,
}

/// Raw completion returned by a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    /// Provider-reported details such as token usage
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Metadata as an optional map, `None` when the provider reported nothing
    pub fn meta_data(&self) -> Option<HashMap<String, String>> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(self.metadata.clone())
        }
    }
}

/// Grounded answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    /// Exact prompt sent to the completion model
    pub prompt: String,
    pub meta_data: Option<HashMap<String, String>>,
}

/// Retrieved span that passed the attribution threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedSpan {
    pub text: String,
    pub source: String,
    pub page: u32,
    /// Attribution confidence, independent of the search score
    pub score: f32,
    pub explanation: String,
}

/// Answer with the spans that support it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub answer: String,
    pub explanation: String,
    /// Best supporting span, empty when no span passed the threshold
    pub supporting_text: String,
    /// Attribution score of `supporting_text`
    pub score: f32,
    pub meta_data: Option<HashMap<String, String>>,
    /// Every span at or above the threshold, best first
    pub spans: Vec<AttributedSpan>,
}

/// Outcome of a fully committed `embed_documents` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSummary {
    pub collection: String,
    /// Distinct sources, in input order
    pub sources: Vec<String>,
    /// Committed chunk labels (`source#page#chunk`)
    pub chunks: Vec<String>,
}
