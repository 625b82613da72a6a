// OpenAI chat completions client

use crate::traits::{ChatClient, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, request: ChatRequest) -> Value {
        let mut messages: Vec<Value> = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.options.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.extend(request.messages.iter().map(|msg: &Message| {
            serde_json::json!({ "role": msg.role(), "content": msg.content() })
        }));

        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(temp) = request.options.temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max_tokens) = request.options.max_tokens {
                obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
            }
        }

        payload
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(request);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: raw.usage.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            stop_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw)?,
        })
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
