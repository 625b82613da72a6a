use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ProductMatch, VectorRecord};

/// A hosted nearest-neighbour index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`top_k` matches for `vector`, highest score first, with metadata
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ProductMatch>>;

    /// Insert or replace records; returns how many were written
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize>;

    /// Total number of vectors stored
    async fn vector_count(&self) -> Result<u64>;
}
