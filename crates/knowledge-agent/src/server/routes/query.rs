//! Search, question answering and completion endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use super::LlmBackend;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Completion, ExplainRequest, Explanation, Filtering, RagAnswer, RagRequest, SearchResult};

/// Body of `POST /semantic/search`
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub llm_backend: LlmBackend,
    #[serde(default)]
    pub filtering: Filtering,
}

/// Body of `POST /rag`
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub llm_backend: LlmBackend,
    #[serde(flatten)]
    pub rag: RagRequest,
}

/// Body of `POST /explanation/explain-qa`
#[derive(Debug, Deserialize)]
pub struct ExplainQaRequest {
    #[serde(default)]
    pub llm_backend: LlmBackend,
    #[serde(flatten)]
    pub explain: ExplainRequest,
}

/// Body of `POST /llm/completion/custom`
#[derive(Debug, Deserialize)]
pub struct CustomPromptRequest {
    pub text: String,
    #[serde(default)]
    pub llm_backend: LlmBackend,
}

/// POST /semantic/search - Similarity search in the provider's collection
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>> {
    tracing::info!("Searching for \"{}\"", request.query);
    let handle = state.handle(&request.llm_backend)?;
    let results = handle.search(&request.query, &request.filtering).await?;
    Ok(Json(results))
}

/// POST /rag - Answer a question from the stored documents
pub async fn question_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<RagAnswer>> {
    tracing::info!("Answering question");
    let handle = state.handle(&request.llm_backend)?;
    let answer = handle.answer(&request.rag).await?;
    Ok(Json(answer))
}

/// POST /explanation/explain-qa - Answer and attribute the answer to spans
pub async fn explain_question_answer(
    State(state): State<AppState>,
    Json(request): Json<ExplainQaRequest>,
) -> Result<Json<Explanation>> {
    tracing::info!("Answering and explaining question");
    let handle = state.handle(&request.llm_backend)?;
    let explanation = handle.explain(&request.explain).await?;
    Ok(Json(explanation))
}

/// POST /llm/completion/custom - Send a prompt to the completion model as is
pub async fn custom_completion(
    State(state): State<AppState>,
    Json(request): Json<CustomPromptRequest>,
) -> Result<Json<Completion>> {
    tracing::info!("Sending custom completion request");
    let handle = state.handle(&request.llm_backend)?;
    let completion = handle.complete(&request.text).await?;
    Ok(Json(completion))
}
