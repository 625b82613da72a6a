//! Retrieval side of the chatbot: embeds customer questions, queries the
//! hosted vector index for matching products, and turns matches into prompt
//! context and citations. The [`catalog`] module feeds the same index from
//! the Shopify store.

pub mod models;
pub mod index;
pub mod pinecone;
pub mod semantic;
pub mod catalog;

pub use models::{ProductMatch, ProductMetadata, SaleInfo, VectorRecord};
pub use index::VectorIndex;
pub use pinecone::PineconeIndex;
pub use semantic::{SemanticSearch, DEFAULT_RELEVANCE_THRESHOLD, DEFAULT_TOP_K, NO_PRODUCT_CONTEXT};
