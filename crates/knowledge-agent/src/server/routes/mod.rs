//! API routes for the knowledge agent

pub mod collection;
pub mod embeddings;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::server::state::AppState;
use crate::types::LlmProvider;

/// Provider selection carried by every request
#[derive(Debug, Clone, Deserialize)]
pub struct LlmBackend {
    /// Provider id or alias (default: `aleph-alpha`)
    #[serde(default = "default_provider")]
    pub llm_provider: String,
    /// API token; falls back to the configured one
    #[serde(default)]
    pub token: Option<String>,
    /// Collection to use instead of the provider default
    #[serde(default)]
    pub collection_name: Option<String>,
}

fn default_provider() -> String {
    LlmProvider::AlephAlpha.as_str().to_string()
}

impl Default for LlmBackend {
    fn default() -> Self {
        Self {
            llm_provider: default_provider(),
            token: None,
            collection_name: None,
        }
    }
}

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route(
            "/collection/create/:provider/:collection",
            post(collection::create_collection),
        )
        .route(
            "/embeddings/delete/:provider/:page/:source",
            delete(collection::delete_vectors),
        )
        // Uploads get the larger body limit
        .route(
            "/embeddings/documents",
            post(embeddings::embed_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/embeddings/text", post(embeddings::embed_text))
        .route(
            "/embeddings/texts/files",
            post(embeddings::embed_text_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/semantic/search", post(query::search))
        .route("/rag", post(query::question_answer))
        .route("/explanation/explain-qa", post(query::explain_question_answer))
        .route("/llm/completion/custom", post(query::custom_completion))
}

/// API info endpoint
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "knowledge-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat with your documents using Aleph Alpha, OpenAI or GPT4All",
        "providers": LlmProvider::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    }))
}
