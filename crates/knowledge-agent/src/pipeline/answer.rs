//! Grounded answers, summaries and raw completions

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::ProviderHandle;
use crate::types::{Completion, RagAnswer, RagRequest};

impl ProviderHandle {
    /// Answer a question from the stored documents.
    ///
    /// A missing or blank query fails before any provider call. Conversation
    /// history is summarized first and the summary goes into the prompt.
    pub async fn answer(&self, request: &RagRequest) -> Result<RagAnswer> {
        let query = request.query().ok_or(Error::MissingQuery)?;

        let history = PromptBuilder::combine_history(&request.history);
        let history_summary = if history.is_empty() {
            None
        } else {
            Some(self.summarize(&history).await?)
        };

        let results = self.search(query, &request.filtering).await?;
        let prompt = PromptBuilder::build_rag_prompt(query, &results, history_summary.as_deref());

        tracing::debug!(
            "Answering with {} ({} context chunks)",
            self.llm().model(),
            results.len()
        );
        let completion = self.llm().complete(&prompt, &self.settings().completion).await?;
        let meta_data = completion.meta_data();

        Ok(RagAnswer {
            answer: completion.text,
            prompt,
            meta_data,
        })
    }

    /// Condense a text with a single completion call
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::MissingQuery);
        }
        let prompt = PromptBuilder::build_summary_prompt(text.trim());
        let completion = self.llm().complete(&prompt, &self.settings().completion).await?;
        Ok(completion.text)
    }

    /// Send a prompt to the completion model unchanged
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.llm().complete(prompt, &self.settings().completion).await
    }
}
