use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LINK};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::document::CatalogProduct;

pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2023-10";
const PAGE_LIMIT: u32 = 250;

/// Admin REST client, read-only, for the product catalog
pub struct ShopifyClient {
    http_client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl ShopifyClient {
    pub fn new(store_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Shopify-Access-Token",
            HeaderValue::from_str(&access_token.into()).context("Invalid access token format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let store_url = store_url.into();
        let store_url = store_url.trim().trim_end_matches('/');
        let base_url = if store_url.starts_with("http://") || store_url.starts_with("https://") {
            store_url.to_string()
        } else {
            format!("https://{}", store_url)
        };

        Ok(Self {
            http_client,
            base_url,
            api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Fetch every product, following cursor pagination to the last page.
    pub async fn fetch_all_products(&self) -> Result<Vec<CatalogProduct>> {
        let mut url = format!(
            "{}/admin/api/{}/products.json?limit={}",
            self.base_url, self.api_version, PAGE_LIMIT
        );
        let mut products = Vec::new();
        let mut pages = 0;

        loop {
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .context("Failed to send request to Shopify")?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Shopify API error ({}): {}", status, error_text);
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let page: ProductsPage = response
                .json()
                .await
                .context("Failed to parse Shopify products response")?;

            pages += 1;
            products.extend(page.products);

            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        tracing::info!(products = products.len(), pages, "Fetched Shopify catalog");
        Ok(products)
    }
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

/// Extract the `rel="next"` target from a Link header.
fn next_page_url(link: &str) -> Option<String> {
    static NEXT_RE: OnceLock<Regex> = OnceLock::new();
    let re = NEXT_RE.get_or_init(|| {
        Regex::new(r#"<([^>]+)>;\s*rel="?next"?"#).expect("valid link regex")
    });
    re.captures(link).map(|c| c[1].to_string())
}
