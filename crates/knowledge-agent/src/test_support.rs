//! In-crate fakes for the provider traits

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pipeline::PipelineSettings;
use crate::providers::{
    AttributionProvider, CompletionOptions, CompletionProvider, EmbeddingProvider, ProviderHandle,
    SpanAttribution, VectorStoreGateway,
};
use crate::types::{Completion, LlmProvider};

pub const DIMENSIONS: usize = 32;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket
pub struct HashEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
    fail_containing: Option<String>,
    transient_failures: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
            fail_containing: None,
            transient_failures: AtomicUsize::new(0),
        }
    }

    /// Fail every text containing `needle` with a provider error
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_containing = Some(needle.to_string());
        self
    }

    /// Time out the next `count` calls
    pub fn timing_out(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(Error::ExternalServiceTimeout {
                service: "hash".to_string(),
            });
        }
        if let Some(needle) = &self.fail_containing {
            if text.contains(needle.as_str()) {
                return Err(Error::Provider {
                    provider: "hash".to_string(),
                    status: Some(400),
                    message: format!("rejected '{}'", text),
                });
            }
        }

        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Completion model that echoes a fixed reply and records prompts
pub struct ScriptedLlm {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock()[index].clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<Completion> {
        self.prompts.lock().push(prompt.to_string());
        let mut completion = Completion::new(self.reply.clone());
        completion
            .metadata
            .insert("model".to_string(), "scripted".to_string());
        Ok(completion)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Attribution with a fixed score per span text
#[derive(Default)]
pub struct ScriptedAttribution {
    scores: HashMap<String, f32>,
    calls: AtomicUsize,
}

impl ScriptedAttribution {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: scores.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributionProvider for ScriptedAttribution {
    async fn attribute(&self, _query: &str, span: &str, _answer: &str) -> Result<SpanAttribution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SpanAttribution {
            score: self.scores.get(span).copied().unwrap_or(0.0),
            explanation: span.to_string(),
        })
    }
}

/// Handle over fakes sharing `store`; settings never wait between retries
pub fn fake_handle(
    binding: LlmProvider,
    store: Arc<dyn VectorStoreGateway>,
    embedder: Arc<HashEmbedder>,
    llm: Arc<ScriptedLlm>,
) -> ProviderHandle {
    let settings = PipelineSettings {
        retry_delay: Duration::ZERO,
        ..Default::default()
    };
    ProviderHandle::new(binding, binding.default_collection(), embedder, llm, store)
        .with_settings(Arc::new(settings))
}

/// Same as `fake_handle` with read retries enabled
pub fn retrying_handle(
    store: Arc<dyn VectorStoreGateway>,
    embedder: Arc<HashEmbedder>,
    llm: Arc<ScriptedLlm>,
    read_retries: u32,
) -> ProviderHandle {
    let settings = PipelineSettings {
        retry_delay: Duration::ZERO,
        read_retries,
        ..Default::default()
    };
    ProviderHandle::new(
        LlmProvider::OpenAi,
        LlmProvider::OpenAi.default_collection(),
        embedder,
        llm,
        store,
    )
    .with_settings(Arc::new(settings))
}
