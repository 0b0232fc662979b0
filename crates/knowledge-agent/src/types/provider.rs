//! The closed set of LLM backends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Backend that supplies embeddings and completions for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    /// Aleph Alpha luminous models (cloud, supports explanations)
    AlephAlpha,
    /// OpenAI models (cloud)
    #[serde(rename = "openai")]
    OpenAi,
    /// GPT4All local server
    #[serde(rename = "gpt4all")]
    Gpt4All,
}

impl LlmProvider {
    /// Every known provider
    pub const ALL: [LlmProvider; 3] = [Self::AlephAlpha, Self::OpenAi, Self::Gpt4All];

    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlephAlpha => "aleph-alpha",
            Self::OpenAi => "openai",
            Self::Gpt4All => "gpt4all",
        }
    }

    /// Collection used when the caller does not name one
    pub fn default_collection(&self) -> &'static str {
        self.as_str()
    }

    /// Whether a token is needed to reach this provider
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Self::Gpt4All)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aleph-alpha" | "aleph_alpha" | "alephalpha" | "aa" => Ok(Self::AlephAlpha),
            "openai" | "open-ai" | "open_ai" => Ok(Self::OpenAi),
            "gpt4all" | "gpt-4-all" | "gpt4-all" | "local" => Ok(Self::Gpt4All),
            _ => Err(Error::UnsupportedProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("aa".parse::<LlmProvider>().unwrap(), LlmProvider::AlephAlpha);
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("gpt4all".parse::<LlmProvider>().unwrap(), LlmProvider::Gpt4All);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "cohere".parse::<LlmProvider>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(ref p) if p == "cohere"));
    }

    #[test]
    fn test_serde_names_match_ids() {
        for provider in LlmProvider::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
        }
    }
}
