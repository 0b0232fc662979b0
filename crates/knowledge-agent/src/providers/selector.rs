//! Provider strategy selection
//!
//! `ProviderSelector` turns a provider id into a `ProviderHandle`: the embedding
//! model, completion model, optional attribution capability and collection that
//! belong to one binding. Pipeline operations live on the handle (see
//! `crate::pipeline`), so callers never branch on the provider after selection.

use std::sync::Arc;

use super::aleph_alpha::AlephAlphaClient;
use super::completion::{AttributionProvider, CompletionProvider};
use super::credentials::CredentialStore;
use super::embedding::EmbeddingProvider;
use super::openai::OpenAiCompatibleClient;
use super::vector_store::VectorStoreGateway;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineSettings;
use crate::types::LlmProvider;

/// Everything one pipeline run needs, bound to a single provider
#[derive(Clone)]
pub struct ProviderHandle {
    binding: LlmProvider,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn CompletionProvider>,
    attribution: Option<Arc<dyn AttributionProvider>>,
    store: Arc<dyn VectorStoreGateway>,
    settings: Arc<PipelineSettings>,
}

impl ProviderHandle {
    /// Assemble a handle from its parts
    pub fn new(
        binding: LlmProvider,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn CompletionProvider>,
        store: Arc<dyn VectorStoreGateway>,
    ) -> Self {
        Self {
            binding,
            collection: collection.into(),
            embedder,
            llm,
            attribution: None,
            store,
            settings: Arc::new(PipelineSettings::default()),
        }
    }

    /// Enable `explain`
    pub fn with_attribution(mut self, attribution: Arc<dyn AttributionProvider>) -> Self {
        self.attribution = Some(attribution);
        self
    }

    pub fn with_settings(mut self, settings: Arc<PipelineSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn binding(&self) -> LlmProvider {
        self.binding
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether this binding can attribute answers to spans
    pub fn supports_explain(&self) -> bool {
        self.attribution.is_some()
    }

    pub(crate) fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub(crate) fn llm(&self) -> &dyn CompletionProvider {
        self.llm.as_ref()
    }

    pub(crate) fn attribution(&self) -> Option<&dyn AttributionProvider> {
        self.attribution.as_deref()
    }

    pub(crate) fn store(&self) -> &dyn VectorStoreGateway {
        self.store.as_ref()
    }

    pub(crate) fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("binding", &self.binding)
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .field("model", &self.llm.model())
            .field("supports_explain", &self.supports_explain())
            .field("store", &self.store.name())
            .finish()
    }
}

/// Builds provider handles from configuration
#[derive(Clone)]
pub struct ProviderSelector {
    config: Arc<RagConfig>,
    credentials: CredentialStore,
    store: Arc<dyn VectorStoreGateway>,
    settings: Arc<PipelineSettings>,
}

impl ProviderSelector {
    pub fn new(config: RagConfig, store: Arc<dyn VectorStoreGateway>) -> Self {
        let credentials = CredentialStore::new(&config.credentials);
        let settings = Arc::new(PipelineSettings::from_config(&config));
        Self {
            config: Arc::new(config),
            credentials,
            store,
            settings,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreGateway> {
        &self.store
    }

    /// Select by provider id.
    ///
    /// Fails with `UnsupportedProvider` for unknown ids and `MissingCredential`
    /// when a cloud provider has neither an explicit nor a configured token.
    pub fn select(
        &self,
        provider_id: &str,
        credential: Option<&str>,
        collection_name: Option<&str>,
    ) -> Result<ProviderHandle> {
        let provider: LlmProvider = provider_id.parse()?;
        self.select_provider(provider, credential, collection_name)
    }

    /// Select a known provider
    pub fn select_provider(
        &self,
        provider: LlmProvider,
        credential: Option<&str>,
        collection_name: Option<&str>,
    ) -> Result<ProviderHandle> {
        let collection = resolve_collection(provider, collection_name)?;
        let token = self.credentials.resolve(provider, credential)?;

        let handle = match (provider, token) {
            (LlmProvider::AlephAlpha, Some(token)) => {
                let client = Arc::new(AlephAlphaClient::new(&self.config.aleph_alpha, &token)?);
                ProviderHandle::new(
                    provider,
                    collection,
                    client.clone(),
                    client.clone(),
                    Arc::clone(&self.store),
                )
                .with_attribution(client)
            }
            (LlmProvider::OpenAi, Some(token)) => {
                let client = Arc::new(OpenAiCompatibleClient::openai(&self.config.openai, &token)?);
                ProviderHandle::new(provider, collection, client.clone(), client, Arc::clone(&self.store))
            }
            (LlmProvider::Gpt4All, _) => {
                let client = Arc::new(OpenAiCompatibleClient::gpt4all(&self.config.gpt4all)?);
                ProviderHandle::new(provider, collection, client.clone(), client, Arc::clone(&self.store))
            }
            (provider, None) => return Err(Error::MissingCredential(provider.to_string())),
        };

        tracing::debug!("Selected provider {:?}", handle);
        Ok(handle.with_settings(Arc::clone(&self.settings)))
    }
}

/// Collection for a binding; another provider's collection is never accepted
fn resolve_collection(provider: LlmProvider, requested: Option<&str>) -> Result<String> {
    let name = match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => return Ok(provider.default_collection().to_string()),
    };

    let foreign = LlmProvider::ALL
        .iter()
        .any(|other| *other != provider && other.default_collection() == name);
    if foreign {
        return Err(Error::BindingMismatch {
            collection: name.to_string(),
            provider: provider.to_string(),
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialsConfig;
    use crate::retrieval::InMemoryVectorStore;

    fn selector() -> ProviderSelector {
        let config = RagConfig {
            credentials: CredentialsConfig {
                aleph_alpha_api_key: Some("aa-token".into()),
                openai_api_key: Some("sk-token".into()),
            },
            ..Default::default()
        };
        ProviderSelector::new(config, Arc::new(InMemoryVectorStore::new()))
    }

    #[test]
    fn test_every_provider_yields_a_handle() {
        let selector = selector();
        for provider in LlmProvider::ALL {
            let handle = selector.select(provider.as_str(), None, None).unwrap();
            assert_eq!(handle.binding(), provider);
            assert_eq!(handle.collection(), provider.default_collection());
            assert_eq!(
                handle.embedder().dimensions(),
                selector.config().dimensions_for(provider)
            );
        }
    }

    #[test]
    fn test_only_aleph_alpha_explains() {
        let selector = selector();
        assert!(selector.select("aleph-alpha", None, None).unwrap().supports_explain());
        assert!(!selector.select("openai", None, None).unwrap().supports_explain());
        assert!(!selector.select("gpt4all", None, None).unwrap().supports_explain());
    }

    #[test]
    fn test_unknown_provider() {
        let err = selector().select("mistral", Some("token"), None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(ref p) if p == "mistral"));
    }

    #[test]
    fn test_cloud_provider_without_token() {
        let selector = ProviderSelector::new(RagConfig::default(), Arc::new(InMemoryVectorStore::new()));
        let err = selector.select("openai", None, None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));

        let err = selector.select("aleph-alpha", Some(""), None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));

        assert!(selector.select("openai", Some("sk-explicit"), None).is_ok());
        assert!(selector.select("gpt4all", None, None).is_ok());
    }

    #[test]
    fn test_custom_collection() {
        let handle = selector().select("openai", None, Some("handbook")).unwrap();
        assert_eq!(handle.collection(), "handbook");
    }

    #[test]
    fn test_foreign_collection_rejected() {
        let err = selector().select("openai", None, Some("aleph-alpha")).unwrap_err();
        assert!(matches!(err, Error::BindingMismatch { .. }));
    }
}
