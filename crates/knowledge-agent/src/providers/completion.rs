//! Completion and attribution provider traits

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Completion;

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// Trait for text generation
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a prompt and return the completion with provider metadata
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model used for completions
    fn model(&self) -> &str;
}

/// How strongly one span supports a generated answer
#[derive(Debug, Clone, PartialEq)]
pub struct SpanAttribution {
    /// Attribution confidence, provider-defined scale (typically 0.0 to 1.0)
    pub score: f32,
    /// The part of the span that carried the score
    pub explanation: String,
}

/// Optional capability: score a retrieved span against an answer.
///
/// Only providers that can compute attributions implement this; a handle
/// without it rejects `explain` before any network call.
#[async_trait]
pub trait AttributionProvider: Send + Sync {
    async fn attribute(&self, query: &str, span: &str, answer: &str) -> Result<SpanAttribution>;
}
