//! Live stock overlay on top of the bundled catalog.
//!
//! Refreshes are best effort. A failed fetch leaves the previous view in
//! place and is only logged; shoppers keep browsing on whatever stock figures
//! were last known (static catalog values at worst).

use std::collections::HashMap;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use crate::catalog::Catalog;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{ProductId, VariationId};
use crate::store::InventoryStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRecord { pub stock: i64, pub is_active: bool }

pub type LiveInventory = HashMap<VariationId, LiveRecord>;

/// Copy of `product` with live stock and active flags applied. Variations
/// missing from `live` keep their catalog values; negative remote stock reads
/// as zero.
pub fn merge_live_inventory(product: &Product, live: &LiveInventory) -> Product {
    let mut merged = product.clone();
    for v in merged.variations.iter_mut() {
        if let Some(record) = live.get(&v.id) {
            v.stock = u32::try_from(record.stock.max(0)).unwrap_or(u32::MAX);
            v.is_active = record.is_active;
        }
    }
    merged
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RefreshOutcome { Merged { records: usize }, Skipped }

pub struct LiveCatalog {
    catalog: Arc<Catalog>,
    store: Arc<dyn InventoryStore>,
    view: RwLock<HashMap<ProductId, Product>>,
}

impl LiveCatalog {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn InventoryStore>) -> Self {
        let view = catalog.products().iter().map(|p| (p.id, p.clone())).collect();
        Self { catalog, store, view: RwLock::new(view) }
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn store(&self) -> Arc<dyn InventoryStore> { self.store.clone() }

    /// Pulls live stock for one product (or all of them) and re-derives the
    /// affected entries of the view from the static catalog.
    pub async fn refresh(&self, product_id: Option<ProductId>) -> RefreshOutcome {
        if let Some(id) = product_id {
            if self.catalog.product(id).is_none() {
                tracing::debug!(product_id = id, "Skipping inventory refresh for unknown product");
                return RefreshOutcome::Skipped;
            }
        }
        let live = match self.store.fetch_variation_inventory(product_id).await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(?product_id, error = %e, "Inventory refresh failed; keeping previous stock view");
                return RefreshOutcome::Skipped;
            }
        };
        let mut view = self.view.write().await;
        for product in self.catalog.products().iter().filter(|p| product_id.map_or(true, |id| p.id == id)) {
            view.insert(product.id, merge_live_inventory(product, &live));
        }
        tracing::debug!(?product_id, records = live.len(), "Merged live inventory");
        RefreshOutcome::Merged { records: live.len() }
    }

    pub async fn product(&self, id: ProductId) -> Option<Product> { self.view.read().await.get(&id).cloned() }

    /// Current view in catalog order.
    pub async fn products(&self) -> Vec<Product> {
        let view = self.view.read().await;
        self.catalog.products().iter().filter_map(|p| view.get(&p.id).cloned()).collect()
    }
}
