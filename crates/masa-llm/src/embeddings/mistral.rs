// Mistral embeddings client

use crate::traits::EmbeddingClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;

const MISTRAL_API_BASE: &str = "https://api.mistral.ai";

pub const MISTRAL_EMBED_MODEL: &str = "mistral-embed";

/// Client for the Mistral `/v1/embeddings` endpoint
pub struct MistralEmbeddingClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl MistralEmbeddingClient {
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
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: MISTRAL_API_BASE.to_string(),
            model: MISTRAL_EMBED_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingClient for MistralEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .http_client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Mistral API error ({}): {}", status, error_text);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let embeddings = parsed.into_ordered();
        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "Mistral returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            );
        }

        Ok(embeddings)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors sorted by `index` so they line up with the request inputs
    fn into_ordered(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeddings_sorted_by_index() {
        let json = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.1]}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_ordered(), vec![vec![0.1], vec![0.5]]);
    }
}
