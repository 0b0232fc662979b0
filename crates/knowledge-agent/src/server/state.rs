//! Application state for the knowledge agent server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::providers::{ProviderHandle, ProviderSelector, VectorStoreGateway};
use crate::retrieval::create_vector_store;

use super::routes::LlmBackend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    selector: ProviderSelector,
}

impl AppState {
    /// Create state with the vector store named in the configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        let store = create_vector_store(&config.vector_db)?;
        Ok(Self::with_store(config, store))
    }

    /// Create state over an existing vector store
    pub fn with_store(config: RagConfig, store: Arc<dyn VectorStoreGateway>) -> Self {
        let selector = ProviderSelector::new(config.clone(), store);
        Self {
            inner: Arc::new(AppStateInner { config, selector }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.inner.selector
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreGateway> {
        self.inner.selector.store()
    }

    /// Provider handle for the backend named in a request
    pub fn handle(&self, backend: &LlmBackend) -> Result<ProviderHandle> {
        self.inner.selector.select(
            &backend.llm_provider,
            backend.token.as_deref(),
            backend.collection_name.as_deref(),
        )
    }
}
