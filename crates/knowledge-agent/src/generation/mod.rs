//! Prompt assembly for grounded answers and summaries

pub mod prompt;

pub use prompt::PromptBuilder;
