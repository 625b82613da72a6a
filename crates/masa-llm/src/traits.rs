use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for hosted text-generation models
///
/// Each call is a single non-streaming completion; the widget only needs the
/// final reply text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Short provider name recorded alongside feedback ("claude", "openai")
    fn provider_name(&self) -> &str;

    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Trait for hosted embedding models
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Model identifier (e.g. `"mistral-embed"`)
    fn model_name(&self) -> &str;

    /// Embed a batch of texts. Output order matches input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system: Option<String>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub stop_reason: Option<String>,
    pub raw: serde_json::Value,
}

impl ChatResponse {
    /// Reply text, rejecting completions that came back empty.
    pub fn text(&self) -> Result<&str> {
        match self.content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => anyhow::bail!("Model returned an empty completion"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
