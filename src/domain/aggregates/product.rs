//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use crate::domain::value_objects::{ProductId, Sku, VariationId};

pub const SIZE_ATTRIBUTE: &str = "Size";

/// Attribute name to selected value, e.g. `{"Size": "M"}`.
pub type AttributeMap = BTreeMap<String, String>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub cloth_type: String,
    pub base_price: Decimal,
    pub base_original_price: Decimal,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    /// Authored value; not derived from the price fields.
    #[serde(default)]
    pub discount_percentage: u8,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub variations: Vec<ProductVariation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute { pub id: String, pub name: String, pub values: Vec<String> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariation {
    pub id: VariationId,
    pub sku: Sku,
    pub attributes: AttributeMap,
    pub price: Decimal,
    pub original_price: Decimal,
    pub stock: u32,
    pub low_stock_threshold: u32,
    pub is_active: bool,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductVariation {
    pub fn size(&self) -> Option<&str> { self.attributes.get(SIZE_ATTRIBUTE).map(String::as_str) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDisplay { pub price: Decimal, pub original_price: Decimal, pub discount_percentage: u8 }

impl Product {
    pub fn primary_image(&self) -> Option<&str> { self.images.first().map(String::as_str) }
    pub fn variation(&self, id: &str) -> Option<&ProductVariation> { self.variations.iter().find(|v| v.id == id) }
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> { self.attributes.iter().map(|a| a.name.as_str()) }

    /// Price shown to the shopper: the resolved variation's own price, or the
    /// product's base price while nothing is selected.
    pub fn display_price(&self, resolved: Option<&ProductVariation>) -> PriceDisplay {
        let (price, original_price) = match resolved {
            Some(v) => (v.price, v.original_price),
            None => (self.base_price, self.base_original_price),
        };
        PriceDisplay { price, original_price, discount_percentage: self.discount_percentage }
    }

    /// A variation is complete when it carries a value for every attribute axis.
    pub fn is_complete(&self, variation: &ProductVariation) -> bool {
        self.attribute_names().all(|name| variation.attributes.contains_key(name))
    }

    /// Authoring checks for a catalog entry.
    pub fn validate(&self) -> Result<(), ProductError> {
        let mut maps = HashSet::new();
        let mut skus = HashSet::new();
        for v in &self.variations {
            if !skus.insert(v.sku.as_str()) {
                return Err(ProductError::DuplicateSku { product_id: self.id, sku: v.sku.to_string() });
            }
            if !maps.insert(&v.attributes) {
                return Err(ProductError::DuplicateVariation { product_id: self.id, sku: v.sku.to_string() });
            }
            // stock deduction finds variations by the size carried in the SKU
            if let Some(size) = v.size() {
                if v.sku.size() != Some(size) {
                    return Err(ProductError::SkuSizeMismatch { sku: v.sku.to_string(), size: size.to_string() });
                }
            }
            for attr in &self.attributes {
                let value = v.attributes.get(&attr.name).ok_or_else(|| ProductError::IncompleteVariation {
                    sku: v.sku.to_string(),
                    attribute: attr.name.clone(),
                })?;
                if !attr.values.contains(value) {
                    return Err(ProductError::UnknownAttributeValue {
                        sku: v.sku.to_string(),
                        attribute: attr.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("product {product_id}: duplicate SKU {sku}")]
    DuplicateSku { product_id: ProductId, sku: String },
    #[error("product {product_id}: variation {sku} repeats another variation's attributes")]
    DuplicateVariation { product_id: ProductId, sku: String },
    #[error("variation {sku} has no value for {attribute}")]
    IncompleteVariation { sku: String, attribute: String },
    #[error("variation {sku} uses {value:?}, not an allowed {attribute}")]
    UnknownAttributeValue { sku: String, attribute: String, value: String },
    #[error("SKU {sku} does not end with its size {size:?}")]
    SkuSizeMismatch { sku: String, size: String },
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::sized_product;

    #[test]
    fn test_display_price_falls_back_to_base() {
        let p = sized_product(1, &[("M", 4, 2, true)]);
        assert_eq!(p.display_price(None).price, Decimal::new(999, 0));
        let shown = p.display_price(p.variations.first());
        assert_eq!(shown.price, Decimal::new(1099, 0));
        assert_eq!(shown.original_price, Decimal::new(1599, 0));
        // authored discount stays as-is even though it disagrees with the prices
        assert_eq!(shown.discount_percentage, 33);
    }

    #[test]
    fn test_validate_rejects_duplicate_attribute_maps() {
        let mut p = sized_product(3, &[("M", 1, 1, true), ("L", 1, 1, true)]);
        assert!(p.validate().is_ok());
        p.variations[1].attributes = p.variations[0].attributes.clone();
        assert!(matches!(p.validate(), Err(ProductError::DuplicateVariation { .. })));
    }

    #[test]
    fn test_validate_rejects_incomplete_and_unknown_values() {
        let mut p = sized_product(4, &[("M", 1, 1, true)]);
        p.variations[0].attributes.insert(SIZE_ATTRIBUTE.into(), "XXXL".into());
        assert!(matches!(p.validate(), Err(ProductError::UnknownAttributeValue { .. })));
        p.variations[0].attributes.clear();
        assert!(!p.is_complete(&p.variations[0]));
        assert!(matches!(p.validate(), Err(ProductError::IncompleteVariation { .. })));
    }

    #[test]
    fn test_validate_rejects_sku_not_ending_in_size() {
        let mut p = sized_product(9, &[("Free", 3, 1, true)]);
        assert_eq!(p.variations[0].sku.as_str(), "PRD009-FREE");
        assert!(matches!(p.validate(), Err(ProductError::SkuSizeMismatch { .. })));
        p.attributes[0].values = vec!["FREE".into()];
        p.variations[0].attributes.insert(SIZE_ATTRIBUTE.into(), "FREE".into());
        assert!(p.validate().is_ok());
    }
}
