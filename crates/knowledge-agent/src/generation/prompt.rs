//! Prompt templates for RAG generation

use crate::types::SearchResult;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Retrieved texts in search-result order, each tagged with its source
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}, Page {}\n{}", i + 1, r.source, r.page, r.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One line per conversation turn
    pub fn combine_history(history: &[String]) -> String {
        history
            .iter()
            .map(|turn| turn.trim())
            .filter(|turn| !turn.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full RAG prompt; the history summary is only included when present
    pub fn build_rag_prompt(
        question: &str,
        results: &[SearchResult],
        history_summary: Option<&str>,
    ) -> String {
        let history = match history_summary.map(str::trim).filter(|s| !s.is_empty()) {
            Some(summary) => format!("\nConversation so far:\n{}\n", summary),
            None => String::new(),
        };

        format!(
            r#"Answer the question using only the information in the context below.
If the context does not contain the answer, say that you do not know.

Context:
{context}
{history}
Question: {question}

Answer:"#,
            context = Self::build_context(results),
            history = history,
            question = question
        )
    }

    /// Build a summarization prompt
    pub fn build_summary_prompt(text: &str) -> String {
        format!(
            r#"Summarize the following text in clear, concise language:

{text}

Summary:"#,
            text = text
        )
    }
}
