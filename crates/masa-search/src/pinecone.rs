// Pinecone data-plane client (REST, no SDK)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;

use crate::index::VectorIndex;
use crate::models::{ProductMatch, VectorRecord};

pub const DEFAULT_PINECONE_API_VERSION: &str = "2024-07";
const UPSERT_BATCH_SIZE: usize = 100;

/// Client bound to a single Pinecone index host
/// (e.g. `https://masa-madre-products-abc123.svc.us-east-1-aws.pinecone.io`).
pub struct PineconeIndex {
    http_client: reqwest::Client,
    host: String,
    namespace: Option<String>,
}

impl PineconeIndex {
    pub fn new(api_key: impl Into<String>, host: impl Into<String>) -> Result<Self> {
        Self::with_api_version(api_key, host, DEFAULT_PINECONE_API_VERSION)
    }

    pub fn with_api_version(
        api_key: impl Into<String>,
        host: impl Into<String>,
        api_version: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(&api_key.into()).context("Invalid API key format")?,
        );
        headers.insert(
            "X-Pinecone-API-Version",
            HeaderValue::from_str(api_version).context("Invalid API version")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            host: normalize_host(&host.into()),
            namespace: None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.host, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send Pinecone request to {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Pinecone API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

/// Hosts are often configured without a scheme; the data plane is HTTPS.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ProductMatch>> {
        let mut body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
            obj.insert("namespace".to_string(), serde_json::json!(ns));
        }

        let parsed: QueryResponse = self
            .post("/query", &body)
            .await?
            .json()
            .await
            .context("Failed to parse Pinecone query response")?;

        Ok(parsed.matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        let mut written = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let mut body = serde_json::json!({ "vectors": batch });
            if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
                obj.insert("namespace".to_string(), serde_json::json!(ns));
            }

            let parsed: UpsertResponse = self
                .post("/vectors/upsert", &body)
                .await?
                .json()
                .await
                .context("Failed to parse Pinecone upsert response")?;

            written += parsed.upserted_count;
            tracing::debug!(batch = batch.len(), upserted = parsed.upserted_count, "Upserted batch");
        }
        Ok(written)
    }

    async fn vector_count(&self) -> Result<u64> {
        let parsed: StatsResponse = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?
            .json()
            .await
            .context("Failed to parse Pinecone stats response")?;
        Ok(parsed.total_vector_count)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ProductMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: u64,
}
