//! Catalog product record, as consumed by the cart and favorites.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A watch from the catalog.
///
/// Field names follow the backend's `products` rows (`waterResistance` is
/// camelCase). Any column this type does not model is kept in `extra` and
/// written back unchanged, so records survive a load/save cycle intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image URI.
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_resistance: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with only the required fields.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: image.into(),
            category: None,
            mechanism: None,
            material: None,
            water_resistance: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_mechanism(mut self, mechanism: impl Into<String>) -> Self {
        self.mechanism = Some(mechanism.into());
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    #[must_use]
    pub fn with_water_resistance(mut self, water_resistance: impl Into<String>) -> Self {
        self.water_resistance = Some(water_resistance.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_row_decodes_with_unknown_columns() {
        let row = r#"{
            "id": 3,
            "name": "Seamaster",
            "price": 5200,
            "image": "https://cdn.example/seamaster.jpg",
            "category": "plongee",
            "waterResistance": "300m",
            "stock": 4
        }"#;
        let product: Product = serde_json::from_str(row).unwrap();

        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.water_resistance.as_deref(), Some("300m"));
        assert_eq!(product.mechanism, None);
        assert_eq!(product.extra.get("stock"), Some(&Value::from(4)));
    }

    #[test]
    fn test_unknown_columns_written_back() {
        let mut product = Product::new(ProductId::new(1), "A", Price::ZERO, "u");
        product.extra.insert("brand".to_string(), Value::from("Omega"));

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["brand"], "Omega");
        assert!(json.get("category").is_none());
    }
}
