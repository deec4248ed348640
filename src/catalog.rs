//! Bundled product catalog.
//!
//! The catalog ships inside the binary (`data/catalog.json`) and is never
//! mutated at runtime; live stock is layered on top by
//! [`LiveCatalog`](crate::inventory::LiveCatalog).

use std::collections::HashSet;
use serde::Deserialize;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;
use crate::{Result, StorefrontError};

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Clone, Debug, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    version: String,
    #[serde(default = "default_currency")]
    currency: String,
    products: Vec<Product>,
}

fn default_currency() -> String { "INR".to_string() }

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self> {
        let catalog = Self { version: String::new(), currency: default_currency(), products };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn bundled() -> Result<Self> { Self::from_json(BUNDLED_CATALOG) }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(raw).map_err(|e| StorefrontError::StorageError(format!("catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn version(&self) -> &str { &self.version }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn products(&self) -> &[Product] { &self.products }
    pub fn product(&self, id: ProductId) -> Option<&Product> { self.products.iter().find(|p| p.id == id) }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut variation_ids = HashSet::new();
        for product in &self.products {
            if !ids.insert(product.id) {
                return Err(StorefrontError::StorageError(format!("catalog: duplicate product id {}", product.id)));
            }
            product.validate()?;
            for v in &product.variations {
                if !variation_ids.insert(v.id.as_str()) {
                    return Err(StorefrontError::StorageError(format!("catalog: duplicate variation id {}", v.id)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::fixtures::sized_product;

    #[test]
    fn test_bundled_catalog_is_well_formed() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.currency(), "INR");
        assert!(!catalog.version().is_empty());
        assert!(catalog.products().len() >= 7);
        let tee = catalog.product(1).unwrap();
        let m = tee.variations.iter().find(|v| v.sku.as_str() == "PRD001-M").unwrap();
        assert_eq!(m.stock, 0);
        for p in catalog.products() {
            assert!(p.variations.iter().all(|v| p.is_complete(v)));
        }
    }

    #[test]
    fn test_duplicate_product_ids_rejected() {
        let result = Catalog::new(vec![sized_product(1, &[("M", 1, 1, true)]), sized_product(1, &[("L", 1, 1, true)])]);
        assert!(matches!(result, Err(StorefrontError::StorageError(_))));
    }

    #[test]
    fn test_authoring_errors_surface() {
        let mut p = sized_product(1, &[("M", 1, 1, true), ("L", 1, 1, true)]);
        p.variations[1].sku = p.variations[0].sku.clone();
        assert!(matches!(Catalog::new(vec![p]), Err(StorefrontError::Catalog(_))));
    }
}
