//! Keeps the vector index in step with the Shopify storefront.

mod document;
mod shopify;
mod sync;

pub use document::{CatalogDocument, CatalogProduct, CatalogVariant};
pub use shopify::{ShopifyClient, DEFAULT_SHOPIFY_API_VERSION};
pub use sync::{CatalogSync, SyncReport};
