//! Storage collaborators.
//!
//! [`InventoryStore`] is the remote relational store holding live stock per
//! variation. [`local::LocalStorage`] stands in for the shopper's browser
//! storage (cart, favorites, recently viewed).

pub mod client;
pub mod local;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{ProductId, VariationId};
use crate::inventory::sync::LiveInventory;
use crate::Result;

pub use client::{ClientStore, SessionContext};
pub use local::{FileStorage, LocalStorage, MemoryStorage};
pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationStock { pub variation_id: VariationId, pub stock: u32 }

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Live `{stock, isActive}` per variation id, optionally for one product only.
    async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory>;

    async fn write_variation_stock(&self, variation_id: &str, new_stock: u32) -> Result<()>;

    async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>>;
}

/// Backend used when no remote store is configured: reads come back empty and
/// writes are dropped, so the storefront runs on static catalog stock.
#[derive(Debug, Default)]
pub struct UnconfiguredStore;

impl UnconfiguredStore {
    pub fn new(reason: &str) -> Self {
        tracing::warn!(reason, "Remote inventory store not configured; serving static catalog stock");
        Self
    }
}

#[async_trait]
impl InventoryStore for UnconfiguredStore {
    async fn fetch_variation_inventory(&self, _product_id: Option<ProductId>) -> Result<LiveInventory> { Ok(LiveInventory::new()) }
    async fn write_variation_stock(&self, _variation_id: &str, _new_stock: u32) -> Result<()> { Ok(()) }
    async fn find_variation_by_product_and_size(&self, _product_id: ProductId, _size: &str) -> Result<Option<VariationStock>> { Ok(None) }
}
