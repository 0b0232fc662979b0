//! Token resolution for cloud providers

use crate::config::CredentialsConfig;
use crate::error::{Error, Result};
use crate::types::LlmProvider;

/// Read-only fallback tokens, resolved once per request
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    aleph_alpha: Option<String>,
    openai: Option<String>,
}

impl CredentialStore {
    pub fn new(config: &CredentialsConfig) -> Self {
        Self {
            aleph_alpha: non_blank(config.aleph_alpha_api_key.as_deref()),
            openai: non_blank(config.openai_api_key.as_deref()),
        }
    }

    /// Resolve the token for a provider.
    ///
    /// Order: explicit value, then configured fallback. The local provider
    /// needs no token and always resolves to `None`.
    pub fn resolve(&self, provider: LlmProvider, explicit: Option<&str>) -> Result<Option<String>> {
        if !provider.requires_credential() {
            return Ok(None);
        }

        let fallback = match provider {
            LlmProvider::AlephAlpha => self.aleph_alpha.clone(),
            LlmProvider::OpenAi => self.openai.clone(),
            LlmProvider::Gpt4All => None,
        };

        non_blank(explicit)
            .or(fallback)
            .map(Some)
            .ok_or_else(|| Error::MissingCredential(provider.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
