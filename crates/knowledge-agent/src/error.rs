//! Error types for the knowledge agent

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type alias for knowledge agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// One item of a batch that could not be committed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailedItem {
    /// Item identifier (chunk label for chunks)
    pub item: String,
    /// Why it failed, or why it was never attempted
    pub reason: String,
}

/// Knowledge agent errors
#[derive(Debug, Error)]
pub enum Error {
    /// Provider id is not one of the known backends
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// Cloud provider selected without a usable token
    #[error("No API token available for provider '{0}'")]
    MissingCredential(String),

    /// Query or text to process was absent or blank
    #[error("Please provide a question")]
    MissingQuery,

    /// Vector length does not match the collection
    #[error("Vector dimension mismatch for collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// Vector database could not be reached
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// External call exceeded its deadline
    #[error("External service timeout: {service}")]
    ExternalServiceTimeout { service: String },

    /// Operation not implemented by the selected provider
    #[error("Operation '{operation}' is not supported by provider '{provider}'")]
    UnsupportedOperation { provider: String, operation: String },

    /// Batch embedding committed only part of its input
    #[error("Batch partially failed: {} committed, {} failed", succeeded.len(), failed.len())]
    PartialBatchFailure {
        succeeded: Vec<String>,
        failed: Vec<FailedItem>,
    },

    /// Collection belongs to a different provider binding
    #[error("Collection '{collection}' belongs to another provider than '{provider}'")]
    BindingMismatch { collection: String, provider: String },

    /// Collection has not been created
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Upstream provider returned an error
    #[error("{provider} error: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Vector database returned an error
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Document could not be loaded
    #[error("Failed to parse file '{filename}': {message}")]
    Parse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error
    pub fn parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a provider error without an HTTP status
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    /// Map a transport error from a provider call
    pub fn from_provider_request(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ExternalServiceTimeout {
                service: provider.to_string(),
            }
        } else {
            Self::Provider {
                provider: provider.to_string(),
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    /// Map a transport error from the vector store
    pub fn from_store_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ExternalServiceTimeout {
                service: "vector-store".to_string(),
            }
        } else if err.is_connect() {
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::VectorStore(err.to_string())
        }
    }

    /// Whether the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ExternalServiceTimeout { .. } | Error::StoreUnavailable(_) => true,
            Error::Provider { status, .. } => {
                matches!(status, Some(s) if *s == 429 || *s >= 500)
            }
            _ => false,
        }
    }

    /// Status code, error type and message for the HTTP layer
    fn response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Error::UnsupportedProvider(_) => (StatusCode::BAD_REQUEST, "unsupported_provider"),
            Error::MissingCredential(_) => (StatusCode::UNAUTHORIZED, "missing_credential"),
            Error::MissingQuery => (StatusCode::BAD_REQUEST, "missing_query"),
            Error::DimensionMismatch { .. } => (StatusCode::BAD_REQUEST, "dimension_mismatch"),
            Error::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            Error::ExternalServiceTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::UnsupportedOperation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unsupported_operation")
            }
            Error::PartialBatchFailure { .. } => (StatusCode::MULTI_STATUS, "partial_failure"),
            Error::BindingMismatch { .. } => (StatusCode::BAD_REQUEST, "binding_mismatch"),
            Error::CollectionNotFound(_) => (StatusCode::NOT_FOUND, "collection_not_found"),
            Error::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
            Error::VectorStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_store_error"),
            Error::Parse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.response_parts();
        let retryable = self.is_retryable();

        let mut error = json!({
            "type": error_type,
            "message": self.to_string(),
            "retryable": retryable,
        });

        if let Error::PartialBatchFailure { succeeded, failed } = &self {
            error["succeeded"] = json!(succeeded);
            error["failed"] = json!(failed);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
