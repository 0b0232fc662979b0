//! OpenAI-compatible client for embeddings and chat completions
//!
//! Used for OpenAI itself and for the GPT4All local server, which exposes the
//! same API without authentication.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::completion::{CompletionOptions, CompletionProvider};
use super::embedding::EmbeddingProvider;
use super::http::{build_client, send_json};
use crate::config::{Gpt4AllConfig, OpenAiConfig};
use crate::error::{Error, Result};
use crate::types::{Completion, LlmProvider};

/// Client for an OpenAI-compatible endpoint
pub struct OpenAiCompatibleClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    embedding_model: String,
    completion_model: String,
    dimensions: usize,
}

impl OpenAiCompatibleClient {
    /// Client for api.openai.com (or a compatible proxy)
    pub fn openai(config: &OpenAiConfig, token: &str) -> Result<Self> {
        let client = build_client(
            LlmProvider::OpenAi.as_str(),
            Some(token),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            provider: LlmProvider::OpenAi,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            dimensions: config.dimensions,
        })
    }

    /// Client for a local GPT4All server
    pub fn gpt4all(config: &Gpt4AllConfig) -> Result<Self> {
        let client = build_client(
            LlmProvider::Gpt4All.as_str(),
            None,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            provider: LlmProvider::Gpt4All,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl ChatResponse {
    fn into_completion(self, provider: &str) -> Result<Completion> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(provider, "no choices in completion response"))?;

        let mut completion = Completion::new(choice.message.content.unwrap_or_default());
        if let Some(model) = self.model {
            completion.metadata.insert("model".to_string(), model);
        }
        if let Some(reason) = choice.finish_reason {
            completion.metadata.insert("finish_reason".to_string(), reason);
        }
        if let Some(usage) = self.usage {
            let meta = &mut completion.metadata;
            meta.insert("prompt_tokens".to_string(), usage.prompt_tokens.to_string());
            meta.insert("completion_tokens".to_string(), usage.completion_tokens.to_string());
            meta.insert("total_tokens".to_string(), usage.total_tokens.to_string());
        }
        Ok(completion)
    }
}

impl EmbeddingResponse {
    fn into_embeddings(mut self, provider: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
        if self.data.len() != expected {
            return Err(Error::provider(
                provider,
                format!("returned {} embeddings for {} inputs", self.data.len(), expected),
            ));
        }
        self.data.sort_by_key(|entry| entry.index);
        Ok(self.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::provider(self.provider.as_str(), "no embedding in response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: &inputs,
        };

        let response: EmbeddingResponse = send_json(
            self.provider.as_str(),
            self.client.post(self.endpoint("embeddings")).json(&request),
        )
        .await?;

        response.into_embeddings(self.provider.as_str(), texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion> {
        let request = ChatRequest {
            model: &self.completion_model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("Sending completion to {} ({})", self.provider, self.completion_model);

        let response: ChatResponse = send_json(
            self.provider.as_str(),
            self.client.post(self.endpoint("chat/completions")).json(&request),
        )
        .await?;

        response.into_completion(self.provider.as_str())
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model(&self) -> &str {
        &self.completion_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_metadata() {
        let response: ChatResponse = serde_json::from_str(
            r#"{
                "model": "gpt-3.5-turbo-0613",
                "choices": [{"message": {"role": "assistant", "content": "Blue."}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
            }"#,
        )
        .unwrap();

        let completion = response.into_completion("openai").unwrap();
        assert_eq!(completion.text, "Blue.");
        assert_eq!(completion.metadata["total_tokens"], "14");
        assert_eq!(completion.metadata["finish_reason"], "stop");
        assert_eq!(completion.metadata["model"], "gpt-3.5-turbo-0613");
    }

    #[test]
    fn test_empty_choices_is_provider_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = response.into_completion("gpt4all").unwrap_err();
        assert!(matches!(err, Error::Provider { ref provider, .. } if provider == "gpt4all"));
    }

    #[test]
    fn test_embeddings_sorted_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"embedding": [2.0], "index": 1}, {"embedding": [1.0], "index": 0}]}"#,
        )
        .unwrap();

        let embeddings = response.into_embeddings("openai", 2).unwrap();
        assert_eq!(embeddings, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_embedding_count_mismatch() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [1.0], "index": 0}]}"#).unwrap();
        assert!(response.into_embeddings("openai", 2).is_err());
    }

    #[test]
    fn test_constructors_do_not_connect() {
        let openai = OpenAiCompatibleClient::openai(&OpenAiConfig::default(), "sk-test").unwrap();
        assert_eq!(EmbeddingProvider::name(&openai), "openai");
        assert_eq!(openai.endpoint("embeddings"), "https://api.openai.com/v1/embeddings");

        let local = OpenAiCompatibleClient::gpt4all(&Gpt4AllConfig::default()).unwrap();
        assert_eq!(local.dimensions(), 384);
        assert_eq!(local.endpoint("chat/completions"), "http://localhost:4891/v1/chat/completions");
    }
}
