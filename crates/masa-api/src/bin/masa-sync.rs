//! Re-index the Shopify catalog into the product vector index.
//!
//! Reads the same configuration as the API server; needs
//! `SHOPIFY_ACCESS_TOKEN`, `MISTRAL_API_KEY` and `PINECONE_API_KEY`.

use std::sync::Arc;

use anyhow::Context;
use masa_api::config::{required_env, Config};
use masa_llm::MistralEmbeddingClient;
use masa_search::catalog::{CatalogSync, ShopifyClient};
use masa_search::{PineconeIndex, VectorIndex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load_settings()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    if config.shopify.store_url.trim().is_empty() {
        anyhow::bail!("shopify.store_url (or SHOPIFY_STORE_URL) is required");
    }
    if config.search.index_host.trim().is_empty() {
        anyhow::bail!("search.index_host (or SEARCH_INDEX_HOST) is required");
    }

    let shopify = ShopifyClient::new(&config.shopify.store_url, required_env("SHOPIFY_ACCESS_TOKEN")?)?
        .with_api_version(config.shopify.api_version.clone());

    let mut embedder = MistralEmbeddingClient::new(required_env("MISTRAL_API_KEY")?)?
        .with_model(config.embedding.model.clone());
    if let Some(base_url) = &config.embedding.base_url {
        embedder = embedder.with_base_url(base_url.clone());
    }

    let index = Arc::new(PineconeIndex::with_api_version(
        required_env("PINECONE_API_KEY")?,
        config.search.index_host.clone(),
        &config.search.api_version,
    )?);

    let products = shopify
        .fetch_all_products()
        .await
        .context("Failed to fetch Shopify catalog")?;

    let sync = CatalogSync::new(Arc::new(embedder), index.clone(), config.shopify.storefront_url.clone());
    let report = sync.sync(&products).await?;

    let total = index.vector_count().await.unwrap_or_default();
    tracing::info!(
        products = report.products,
        upserted = report.upserted,
        index_total = total,
        "Catalog indexed"
    );

    Ok(())
}
