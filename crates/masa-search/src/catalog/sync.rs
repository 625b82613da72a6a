use std::sync::Arc;

use anyhow::{Context, Result};
use masa_llm::EmbeddingClient;

use super::document::CatalogProduct;
use crate::index::VectorIndex;
use crate::models::VectorRecord;

const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub products: usize,
    pub upserted: usize,
}

/// Embeds catalog documents and writes them to the vector index
pub struct CatalogSync {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    storefront: String,
    batch_size: usize,
}

impl CatalogSync {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        storefront: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            storefront: storefront.into(),
            batch_size: EMBED_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn sync(&self, products: &[CatalogProduct]) -> Result<SyncReport> {
        let documents: Vec<_> = products
            .iter()
            .map(|p| p.to_document(&self.storefront))
            .collect();

        let mut upserted = 0;
        for (batch_no, batch) in documents.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .with_context(|| format!("Failed to embed catalog batch {}", batch_no))?;

            let records = batch
                .iter()
                .zip(vectors)
                .map(|(doc, values)| VectorRecord {
                    id: doc.id.clone(),
                    values,
                    metadata: doc.metadata.clone(),
                })
                .collect();

            upserted += self.index.upsert(records).await?;
            tracing::debug!(batch = batch_no, size = batch.len(), "Catalog batch indexed");
        }

        tracing::info!(products = products.len(), upserted, "Catalog sync complete");
        Ok(SyncReport {
            products: products.len(),
            upserted,
        })
    }
}
