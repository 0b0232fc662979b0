//! Answers with span attribution

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::ProviderHandle;
use crate::types::{AttributedSpan, ExplainRequest, Explanation};

impl ProviderHandle {
    /// Answer from the top `explain_documents` search results, then score each
    /// of those spans against the answer.
    ///
    /// Spans scoring at least `explain_threshold` are kept, best first. Fails
    /// with `UnsupportedOperation` on bindings without attribution and with
    /// `MissingQuery` on a blank query, both before any provider call.
    pub async fn explain(&self, request: &ExplainRequest) -> Result<Explanation> {
        let attribution = self
            .attribution()
            .ok_or_else(|| Error::unsupported_operation(self.binding().as_str(), "explain"))?;
        let query = request.rag_request.query().ok_or(Error::MissingQuery)?;

        let mut results = self.search(query, &request.rag_request.filtering).await?;
        results.truncate(request.explain_documents.max(1));

        let prompt = PromptBuilder::build_rag_prompt(query, &results, None);
        let completion = self.llm().complete(&prompt, &self.settings().completion).await?;

        let mut spans = Vec::new();
        for result in &results {
            let attributed = attribution
                .attribute(query, &result.text, &completion.text)
                .await?;
            if attributed.score >= request.explain_threshold {
                spans.push(AttributedSpan {
                    text: result.text.clone(),
                    source: result.source.clone(),
                    page: result.page,
                    score: attributed.score,
                    explanation: attributed.explanation,
                });
            } else {
                tracing::debug!(
                    "Dropping span from {}#{}: score {:.3} below {:.3}",
                    result.source,
                    result.page,
                    attributed.score,
                    request.explain_threshold
                );
            }
        }
        // Stable: equal scores stay in retrieval order
        spans.sort_by(|a, b| b.score.total_cmp(&a.score));

        let explanation = spans
            .iter()
            .map(|s| s.explanation.as_str())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let (supporting_text, score) = spans
            .first()
            .map(|s| (s.text.clone(), s.score))
            .unwrap_or_default();

        tracing::info!(
            "Explained answer with {} of {} spans",
            spans.len(),
            results.len()
        );

        let meta_data = completion.meta_data();
        Ok(Explanation {
            answer: completion.text,
            explanation,
            supporting_text,
            score,
            meta_data,
            spans,
        })
    }
}
