use masa_types::Source;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One sale entry as stored (JSON-encoded) in the `sale_info` metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleInfo {
    pub variant_title: String,
    pub original_price: f64,
    pub current_price: f64,
    pub discount_percent: u32,
}

/// Metadata attached to each product vector.
///
/// `has_active_sale` is stored as the string `"True"`/`"False"` by the
/// catalog sync, but booleans are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub has_active_sale: Option<Value>,
    #[serde(default)]
    pub sale_info: Option<String>,
}

impl ProductMetadata {
    pub fn has_active_sale(&self) -> bool {
        match &self.has_active_sale {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Decoded sale entries; malformed or missing data yields an empty list.
    pub fn sales(&self) -> Vec<SaleInfo> {
        self.sale_info
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// A nearest-neighbour hit returned by the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: ProductMetadata,
}

impl ProductMatch {
    /// Citation shown to the customer, with the widget's fallback labels for
    /// missing metadata.
    pub fn to_source(&self) -> Source {
        let defaults = Source::default();
        let meta = &self.metadata;
        Source {
            title: meta.title.clone().unwrap_or(defaults.title),
            url: meta.source_url.clone().unwrap_or(defaults.url),
            price: meta.price_range.clone().unwrap_or(defaults.price),
            availability: meta.availability.clone().unwrap_or(defaults.availability),
            category: meta.category.clone().unwrap_or(defaults.category),
            score: self.score,
        }
    }
}

/// A vector plus metadata ready to be written to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}
