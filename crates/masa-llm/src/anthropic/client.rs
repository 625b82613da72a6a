// Anthropic Messages API client

use crate::traits::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 512;

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic client (HTTP direct, no SDK)
pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: ANTHROPIC_API_BASE.to_string(),
        })
    }

    /// Override the base URL (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build Messages API payload. System messages are lifted into the
    /// top-level `system` field, which is where Anthropic expects them.
    fn build_request(&self, request: ChatRequest) -> AnthropicRequest {
        let mut system_parts: Vec<String> = request.options.system.into_iter().collect();
        let mut messages = Vec::with_capacity(request.messages.len());

        for message in request.messages {
            match message {
                Message::System { content } => system_parts.push(content),
                Message::User { content } => messages.push(AnthropicMessage {
                    role: "user".to_string(),
                    content,
                }),
                Message::Assistant { content } => messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content,
                }),
            }
        }

        AnthropicRequest {
            model: request.model,
            max_tokens: request.options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.options.temperature,
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages,
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_request(request);

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        let raw: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let text: String = raw
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        tracing::debug!(
            model = %raw.model,
            input_tokens = raw.usage.input_tokens,
            output_tokens = raw.usage.output_tokens,
            "Anthropic completion received"
        );

        Ok(ChatResponse {
            content: if text.is_empty() { None } else { Some(text) },
            usage: Some(TokenUsage {
                input_tokens: raw.usage.input_tokens,
                output_tokens: raw.usage.output_tokens,
            }),
            stop_reason: raw.stop_reason.clone(),
            raw: serde_json::to_value(raw)?,
        })
    }
}

// ============================================================================
// ANTHROPIC WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
