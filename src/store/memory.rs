//! In-process inventory store seeded from the catalog. Used for local runs
//! without a database and by the test suite.

use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::catalog::Catalog;
use crate::domain::aggregates::product::SIZE_ATTRIBUTE;
use crate::domain::value_objects::ProductId;
use crate::inventory::sync::{LiveInventory, LiveRecord};
use crate::store::{InventoryStore, VariationStock};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
struct Row { variation_id: String, product_id: ProductId, size: Option<String>, stock: i64, is_active: bool }

#[derive(Debug, Default)]
pub struct MemoryInventoryStore { rows: RwLock<Vec<Row>> }

impl MemoryInventoryStore {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let rows = catalog
            .products()
            .iter()
            .flat_map(|p| p.variations.iter().map(move |v| Row {
                variation_id: v.id.clone(),
                product_id: p.id,
                size: v.attributes.get(SIZE_ATTRIBUTE).cloned(),
                stock: i64::from(v.stock),
                is_active: v.is_active,
            }))
            .collect();
        Self { rows: RwLock::new(rows) }
    }

    pub async fn stock_of(&self, variation_id: &str) -> Option<i64> {
        self.rows.read().await.iter().find(|r| r.variation_id == variation_id).map(|r| r.stock)
    }

    /// Overrides a row as an admin edit in the remote store would.
    pub async fn set_stock(&self, variation_id: &str, stock: i64, is_active: bool) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|r| r.variation_id == variation_id)
            .ok_or_else(|| StorefrontError::Remote(format!("no variation {variation_id}")))?;
        row.stock = stock;
        row.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory> {
        Ok(self.rows.read().await.iter()
            .filter(|r| product_id.map_or(true, |id| r.product_id == id))
            .map(|r| (r.variation_id.clone(), LiveRecord { stock: r.stock, is_active: r.is_active }))
            .collect())
    }

    async fn write_variation_stock(&self, variation_id: &str, new_stock: u32) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|r| r.variation_id == variation_id)
            .ok_or_else(|| StorefrontError::Remote(format!("no variation {variation_id}")))?;
        row.stock = i64::from(new_stock);
        Ok(())
    }

    async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>> {
        Ok(self.rows.read().await.iter()
            .find(|r| r.product_id == product_id && r.size.as_deref() == Some(size))
            .map(|r| VariationStock { variation_id: r.variation_id.clone(), stock: u32::try_from(r.stock.max(0)).unwrap_or(u32::MAX) }))
    }
}
