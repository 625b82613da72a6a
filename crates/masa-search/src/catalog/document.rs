use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::models::SaleInfo;

/// Product as returned by the Shopify Admin API (fields the index needs)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    /// Comma-separated, as Shopify sends it
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "price")]
    pub compare_at_price: Option<f64>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub inventory_management: Option<String>,
    #[serde(default)]
    pub inventory_policy: Option<String>,
}

impl CatalogVariant {
    fn in_stock(&self) -> bool {
        let untracked = self.inventory_management.is_none();
        let oversell = self.inventory_policy.as_deref() == Some("continue");
        untracked || oversell || self.inventory_quantity.unwrap_or(0) > 0
    }

    fn sale(&self) -> Option<SaleInfo> {
        let current = self.price?;
        let original = self.compare_at_price?;
        if original <= current || original <= 0.0 {
            return None;
        }
        Some(SaleInfo {
            variant_title: self.title.clone(),
            original_price: original,
            current_price: current,
            discount_percent: ((original - current) / original * 100.0).round() as u32,
        })
    }
}

/// Shopify encodes money as strings ("120.00"); accept numbers too.
fn price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}

/// Text to embed plus the metadata stored next to the vector
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl CatalogProduct {
    pub fn category(&self) -> String {
        match self.product_type.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_lowercase(),
            _ => "otro".to_string(),
        }
    }

    pub fn price_range(&self) -> String {
        let prices: Vec<f64> = self.variants.iter().filter_map(|v| v.price).collect();
        if prices.is_empty() {
            return "Consultar".to_string();
        }
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            format!("${:.2} MXN", min)
        } else {
            format!("${:.2} - ${:.2} MXN", min, max)
        }
    }

    pub fn availability(&self) -> &'static str {
        if self.variants.iter().any(CatalogVariant::in_stock) {
            "Disponible"
        } else {
            "Agotado"
        }
    }

    pub fn sales(&self) -> Vec<SaleInfo> {
        self.variants.iter().filter_map(CatalogVariant::sale).collect()
    }

    pub fn description(&self) -> String {
        self.body_html.as_deref().map(strip_html).unwrap_or_default()
    }

    pub fn to_document(&self, storefront: &str) -> CatalogDocument {
        let category = self.category();
        let price_range = self.price_range();
        let availability = self.availability();
        let sales = self.sales();
        let description = self.description();
        let storefront = storefront
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let source_url = format!("https://{}/products/{}", storefront, self.handle);

        let mut text = format!(
            "Producto: {}\nCategoría: {}\nPrecio: {}\nDisponibilidad: {}",
            self.title, category, price_range, availability
        );
        if !description.is_empty() {
            text.push_str(&format!("\nDescripción: {}", description));
        }
        let tags: Vec<&str> = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            text.push_str(&format!("\nEtiquetas: {}", tags.join(", ")));
        }
        for sale in &sales {
            text.push_str(&format!(
                "\nOferta: {} de ${:.2} a ${:.2} MXN ({}% OFF)",
                sale.variant_title, sale.original_price, sale.current_price, sale.discount_percent
            ));
        }

        let mut metadata = Map::new();
        metadata.insert("title".into(), Value::String(self.title.clone()));
        metadata.insert("category".into(), Value::String(category));
        metadata.insert("price_range".into(), Value::String(price_range));
        metadata.insert("availability".into(), Value::String(availability.to_string()));
        metadata.insert("source_url".into(), Value::String(source_url));
        metadata.insert(
            "has_active_sale".into(),
            Value::String(if sales.is_empty() { "False" } else { "True" }.to_string()),
        );
        metadata.insert(
            "sale_info".into(),
            Value::String(serde_json::to_string(&sales).unwrap_or_else(|_| "[]".to_string())),
        );
        if let Some(vendor) = self.vendor.as_deref().filter(|v| !v.is_empty()) {
            metadata.insert("vendor".into(), Value::String(vendor.to_string()));
        }

        CatalogDocument {
            id: format!("product_{}", self.id),
            text,
            metadata,
        }
    }
}

fn strip_html(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static WS_RE: OnceLock<Regex> = OnceLock::new();
    let tags = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
    let ws = WS_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));
    let text = tags.replace_all(html, " ");
    let text = text.replace("&nbsp;", " ").replace("&amp;", "&");
    ws.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(json: serde_json::Value) -> CatalogProduct {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_price_range_single_and_multiple() {
        let single = product(serde_json::json!({
            "id": 1, "variants": [{"id": 10, "price": "120.00"}, {"id": 11, "price": "120.00"}]
        }));
        assert_eq!(single.price_range(), "$120.00 MXN");

        let range = product(serde_json::json!({
            "id": 2, "variants": [{"id": 10, "price": "180.00"}, {"id": 11, "price": "120.5"}]
        }));
        assert_eq!(range.price_range(), "$120.50 - $180.00 MXN");

        assert_eq!(product(serde_json::json!({"id": 3})).price_range(), "Consultar");
    }

    #[test]
    fn test_availability() {
        let sold_out = product(serde_json::json!({
            "id": 1,
            "variants": [{"id": 10, "inventory_quantity": 0, "inventory_management": "shopify", "inventory_policy": "deny"}]
        }));
        assert_eq!(sold_out.availability(), "Agotado");

        let backorder = product(serde_json::json!({
            "id": 1,
            "variants": [{"id": 10, "inventory_quantity": 0, "inventory_management": "shopify", "inventory_policy": "continue"}]
        }));
        assert_eq!(backorder.availability(), "Disponible");

        let untracked = product(serde_json::json!({"id": 1, "variants": [{"id": 10}]}));
        assert_eq!(untracked.availability(), "Disponible");
    }

    #[test]
    fn test_document_metadata() {
        let p = product(serde_json::json!({
            "id": 42,
            "handle": "hogaza-centeno",
            "title": "Hogaza de centeno",
            "body_html": "<p>Fermentación <strong>lenta</strong> de 48&nbsp;horas</p>",
            "product_type": "Pan",
            "tags": "centeno, integral,",
            "variants": [
                {"id": 1, "title": "1 kg", "price": "150.00", "compare_at_price": "180.00", "inventory_quantity": 3, "inventory_management": "shopify"},
                {"id": 2, "title": "500 g", "price": "90.00", "compare_at_price": null, "inventory_quantity": 0, "inventory_management": "shopify"}
            ]
        }));

        let doc = p.to_document("masamadremonterrey.com");
        assert_eq!(doc.id, "product_42");
        assert_eq!(doc.metadata["category"], "pan");
        assert_eq!(doc.metadata["price_range"], "$90.00 - $150.00 MXN");
        assert_eq!(doc.metadata["availability"], "Disponible");
        assert_eq!(doc.metadata["has_active_sale"], "True");
        assert_eq!(
            doc.metadata["source_url"],
            "https://masamadremonterrey.com/products/hogaza-centeno"
        );
        assert!(doc.text.contains("Descripción: Fermentación lenta de 48 horas"));
        assert!(doc.text.contains("Etiquetas: centeno, integral"));

        let sales: Vec<SaleInfo> =
            serde_json::from_str(doc.metadata["sale_info"].as_str().unwrap()).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].discount_percent, 17);
    }

    #[test]
    fn test_empty_product_type_is_otro() {
        let p = product(serde_json::json!({"id": 1, "product_type": "  "}));
        assert_eq!(p.category(), "otro");
        let doc = p.to_document("https://shop.example/");
        assert_eq!(doc.metadata["has_active_sale"], "False");
        assert_eq!(doc.metadata["source_url"], "https://shop.example/products/");
    }
}
