use std::sync::Arc;

use anyhow::{Context, Result};
use masa_llm::EmbeddingClient;
use masa_types::Source;

use crate::index::VectorIndex;
use crate::models::ProductMatch;

pub const DEFAULT_TOP_K: usize = 3;

/// Minimum index score for a match to be offered as a citation
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.80;

pub const NO_PRODUCT_CONTEXT: &str = "No se encontró información de productos específica.";

const MAX_SALES_IN_CONTEXT: usize = 2;

/// Embeds a question and retrieves the closest catalog entries
#[derive(Clone)]
pub struct SemanticSearch {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    relevance_threshold: f32,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Raw top-K matches (with scores) for a question
    pub async fn search(&self, query: &str) -> Result<Vec<ProductMatch>> {
        let vector = self
            .embedder
            .embed_query(query)
            .await
            .context("Failed to embed query")?;

        let matches = self
            .index
            .query(vector, self.top_k)
            .await
            .context("Vector index query failed")?;

        tracing::debug!(matches = matches.len(), top_k = self.top_k, "Semantic search complete");
        Ok(matches)
    }

    /// Matches at or above the relevance threshold, as citations
    pub fn filter_sources(&self, matches: &[ProductMatch]) -> Vec<Source> {
        let sources: Vec<Source> = matches
            .iter()
            .filter(|m| {
                let keep = m.score >= self.relevance_threshold;
                if !keep {
                    tracing::debug!(
                        score = m.score,
                        title = m.metadata.title.as_deref().unwrap_or("Sin título"),
                        "Match below relevance threshold"
                    );
                }
                keep
            })
            .map(ProductMatch::to_source)
            .collect();

        tracing::info!(
            found = matches.len(),
            suggested = sources.len(),
            threshold = self.relevance_threshold,
            "Products retrieved"
        );
        sources
    }

    /// Render matches as the product-context block of the prompt.
    pub fn format_context(matches: &[ProductMatch]) -> String {
        if matches.is_empty() {
            return NO_PRODUCT_CONTEXT.to_string();
        }

        matches
            .iter()
            .map(format_match)
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

fn format_match(hit: &ProductMatch) -> String {
    let source = hit.to_source();
    let mut content = format!(
        "ID: {}\nTítulo: {}\nCategoría: {}\nPrecio: {}\nDisponibilidad: {}\nURL: {}\n",
        hit.id, source.title, source.category, source.price, source.availability, source.url
    );

    let sales = hit.metadata.sales();
    if hit.metadata.has_active_sale() && !sales.is_empty() {
        content.push_str("\nOfertas Vigentes: ");
        for sale in sales.iter().take(MAX_SALES_IN_CONTEXT) {
            content.push_str(&format!(
                "\n- {}: De ${:.2} a ${:.2} MXN ({}% OFF)",
                sale.variant_title, sale.original_price, sale.current_price, sale.discount_percent
            ));
        }
    }

    content
}
