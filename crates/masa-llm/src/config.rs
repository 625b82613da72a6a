// Provider-agnostic chat client creation from configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::traits::ChatClient;

/// Type of generation provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    #[serde(alias = "claude")]
    Anthropic,
    OpenAI,
}

impl std::str::FromStr for ProviderType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderType::Anthropic),
            "openai" => Ok(ProviderType::OpenAI),
            other => anyhow::bail!("Unknown LLM provider: {}", other),
        }
    }
}

/// Credentials and endpoint for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderType,
    pub api_key: String,
    /// Base URL override (defaults to the provider's public API)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderType::Anthropic,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderType::OpenAI,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        self.provider
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        match config.provider {
            ProviderType::Anthropic => {
                let mut client = crate::anthropic::AnthropicClient::new(config.api_key)?;
                if let Some(base_url) = config.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
            ProviderType::OpenAI => {
                let mut client = crate::openai::OpenAIClient::new(config.api_key)?;
                if let Some(base_url) = config.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("anthropic".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert_eq!("Claude".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert_eq!("openai".parse::<ProviderType>().unwrap(), ProviderType::OpenAI);
        assert!("mistral".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_provider_deserializes_claude_alias() {
        let provider: ProviderType = serde_json::from_str("\"claude\"").unwrap();
        assert_eq!(provider, ProviderType::Anthropic);
        let provider: ProviderType = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(provider, ProviderType::Anthropic);
    }

    #[test]
    fn test_factory_picks_provider() {
        let claude = ClientFactory::create_chat_client(ProviderConfig::anthropic("k")).unwrap();
        assert_eq!(claude.provider_name(), "claude");

        let openai = ClientFactory::create_chat_client(
            ProviderConfig::openai("k").with_base_url("http://localhost:9999/v1"),
        )
        .unwrap();
        assert_eq!(openai.provider_name(), "openai");
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ProviderConfig::openai("k");
        let json = serde_json::to_string(&config).unwrap();
        let back: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.provider_type(), ProviderType::OpenAI);
    }
}
