//! Aleph Alpha client for semantic embeddings, completions and explanations
//!
//! This is the only backend that implements `AttributionProvider`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::completion::{AttributionProvider, CompletionOptions, CompletionProvider, SpanAttribution};
use super::embedding::EmbeddingProvider;
use super::http::{build_client, send_json};
use crate::config::AlephAlphaConfig;
use crate::error::{Error, Result};
use crate::types::Completion;

const PROVIDER: &str = "aleph-alpha";

/// Aleph Alpha API client
pub struct AlephAlphaClient {
    client: Client,
    base_url: String,
    embedding_model: String,
    completion_model: String,
    dimensions: usize,
}

impl AlephAlphaClient {
    /// Create a client; no request is made until an operation runs
    pub fn new(config: &AlephAlphaConfig, token: &str) -> Result<Self> {
        let client = build_client(PROVIDER, Some(token), Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn semantic_embed(&self, text: &str, representation: &'static str) -> Result<Vec<f32>> {
        let request = SemanticEmbedRequest {
            model: &self.embedding_model,
            prompt: text,
            representation,
            compress_to_size: (self.dimensions == 128).then_some(128),
        };

        let response: SemanticEmbedResponse = send_json(
            PROVIDER,
            self.client.post(self.endpoint("semantic_embed")).json(&request),
        )
        .await?;

        Ok(response.embedding)
    }
}

#[derive(Serialize)]
struct SemanticEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    representation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    compress_to_size: Option<usize>,
}

#[derive(Deserialize)]
struct SemanticEmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    maximum_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    #[serde(default)]
    model_version: Option<String>,
    completions: Vec<CompletionItem>,
}

#[derive(Debug, Deserialize)]
struct CompletionItem {
    completion: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Serialize)]
struct ExplainRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    target: &'a str,
    prompt_granularity: Granularity,
    normalize: bool,
}

#[derive(Serialize)]
struct Granularity {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    explanations: Vec<TargetExplanation>,
}

#[derive(Debug, Deserialize)]
struct TargetExplanation {
    items: Vec<ExplanationItem>,
}

#[derive(Debug, Deserialize)]
struct ExplanationItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    scores: Vec<TextScore>,
}

#[derive(Debug, Deserialize)]
struct TextScore {
    start: usize,
    length: usize,
    score: f32,
}

impl CompleteResponse {
    fn into_completion(self) -> Result<Completion> {
        let item = self
            .completions
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(PROVIDER, "no completion in response"))?;

        let mut completion = Completion::new(item.completion.trim().to_string());
        if let Some(version) = self.model_version {
            completion.metadata.insert("model_version".to_string(), version);
        }
        if let Some(reason) = item.finish_reason {
            completion.metadata.insert("finish_reason".to_string(), reason);
        }
        Ok(completion)
    }
}

/// Prompt used for explanations; the span comes first so its character
/// range is `0..span_len`.
fn explain_prompt(query: &str, span: &str) -> String {
    format!("{}\n\n### Instruction:\n{}\n\n### Response:", span, query)
}

impl ExplainResponse {
    /// Highest text score that overlaps the span, with the scored text
    fn best_span_score(&self, span: &str) -> SpanAttribution {
        let span_chars: Vec<char> = span.chars().collect();

        let best = self
            .explanations
            .iter()
            .flat_map(|e| e.items.iter())
            .filter(|item| item.kind == "text")
            .flat_map(|item| item.scores.iter())
            .filter(|s| s.start < span_chars.len() && s.length > 0)
            .fold(None::<&TextScore>, |best, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s),
            });

        match best {
            Some(score) => {
                let end = (score.start + score.length).min(span_chars.len());
                SpanAttribution {
                    score: score.score,
                    explanation: span_chars[score.start..end].iter().collect::<String>().trim().to_string(),
                }
            }
            None => SpanAttribution {
                score: 0.0,
                explanation: String::new(),
            },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for AlephAlphaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.semantic_embed(text, "document").await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.semantic_embed(text, "query").await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl CompletionProvider for AlephAlphaClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion> {
        let request = CompleteRequest {
            model: &self.completion_model,
            prompt,
            maximum_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response: CompleteResponse = send_json(
            PROVIDER,
            self.client.post(self.endpoint("complete")).json(&request),
        )
        .await?;

        response.into_completion()
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.completion_model
    }
}

#[async_trait]
impl AttributionProvider for AlephAlphaClient {
    async fn attribute(&self, query: &str, span: &str, answer: &str) -> Result<SpanAttribution> {
        let prompt = explain_prompt(query, span);
        let request = ExplainRequest {
            model: &self.completion_model,
            prompt: &prompt,
            target: answer,
            prompt_granularity: Granularity { kind: "sentence" },
            normalize: true,
        };

        let response: ExplainResponse = send_json(
            PROVIDER,
            self.client.post(self.endpoint("explain")).json(&request),
        )
        .await?;

        Ok(response.best_span_score(span))
    }
}
