//! Embedding endpoints for uploads and raw text

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::LlmBackend;
use crate::error::{Error, Result};
use crate::ingestion::split_on_separator;
use crate::server::state::AppState;
use crate::types::{EmbedInput, EmbeddingSummary, UploadedFile};

/// Separator used when a request names none
const DEFAULT_SEPARATOR: &str = "###";

/// Result of an embedding request
#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub status: &'static str,
    pub files: Vec<String>,
    pub collection: String,
    /// Committed chunk labels (`source#page#chunk`)
    pub chunks: Vec<String>,
}

impl EmbeddingResponse {
    fn success(files: Vec<String>, summary: EmbeddingSummary) -> Self {
        Self {
            status: "success",
            files,
            collection: summary.collection,
            chunks: summary.chunks,
        }
    }
}

/// Body of `POST /embeddings/text`
#[derive(Debug, Deserialize)]
pub struct EmbedTextRequest {
    pub text: String,
    pub file_name: String,
    #[serde(default = "default_separator", alias = "seperator")]
    pub separator: String,
    #[serde(default)]
    pub llm_backend: LlmBackend,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Multipart upload: backend fields, an optional separator and the files
#[derive(Debug, Default)]
struct UploadForm {
    backend: LlmBackend,
    separator: Option<String>,
    files: Vec<UploadedFile>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::parse("multipart", e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::parse(&file_name, format!("Failed to read upload: {}", e)))?;
                tracing::info!("Received file: {} ({} bytes)", file_name, data.len());
                form.files.push(UploadedFile::new(file_name, data));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| Error::parse("multipart", format!("Failed to read field '{}': {}", name, e)))?;
            let value = Some(value).filter(|v| !v.trim().is_empty());
            match name.as_str() {
                "llm_provider" => {
                    if let Some(provider) = value {
                        form.backend.llm_provider = provider;
                    }
                }
                "token" => form.backend.token = value,
                "collection_name" => form.backend.collection_name = value,
                "separator" | "seperator" => form.separator = value,
                other => tracing::debug!("Ignoring form field '{}'", other),
            }
        }

        Ok(form)
    }

    fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_name.clone()).collect()
    }
}

/// POST /embeddings/documents - Upload and embed PDF, text and markdown files
pub async fn embed_documents(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EmbeddingResponse>> {
    let form = UploadForm::read(multipart).await?;
    let handle = state.handle(&form.backend)?;
    let files = form.file_names();

    tracing::info!("Embedding {} documents", files.len());
    let summary = handle.embed_documents(EmbedInput::Files(form.files)).await?;
    Ok(Json(EmbeddingResponse::success(files, summary)))
}

/// POST /embeddings/text - Embed raw text split on a separator
pub async fn embed_text(
    State(state): State<AppState>,
    Json(request): Json<EmbedTextRequest>,
) -> Result<Json<EmbeddingResponse>> {
    let handle = state.handle(&request.llm_backend)?;

    tracing::info!("Embedding text as {}", request.file_name);
    let files = vec![request.file_name.clone()];
    let summary = handle
        .embed_documents(EmbedInput::Text {
            text: request.text,
            file_name: request.file_name,
            separator: request.separator,
        })
        .await?;
    Ok(Json(EmbeddingResponse::success(files, summary)))
}

/// POST /embeddings/texts/files - Embed uploaded text files split on a separator
pub async fn embed_text_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EmbeddingResponse>> {
    let form = UploadForm::read(multipart).await?;
    let handle = state.handle(&form.backend)?;
    let separator = form.separator.clone().unwrap_or_else(default_separator);
    let files = form.file_names();

    let mut chunks = Vec::new();
    for file in &form.files {
        let text = std::str::from_utf8(&file.data)
            .map_err(|e| Error::parse(&file.file_name, format!("Not UTF-8 text: {}", e)))?;
        chunks.extend(split_on_separator(text, &file.file_name, &separator));
    }

    tracing::info!("Embedding {} text files ({} chunks)", files.len(), chunks.len());
    let summary = handle.embed_documents(EmbedInput::Chunks(chunks)).await?;
    Ok(Json(EmbeddingResponse::success(files, summary)))
}
