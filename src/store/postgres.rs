//! Postgres-backed inventory store (`product_variations` table).
//!
//! Stock writes are plain `UPDATE`s of a previously read value: there is no
//! row lock or version check, so two concurrent buyers of the last unit can
//! both succeed.

use async_trait::async_trait;
use sqlx::PgPool;
use crate::catalog::Catalog;
use crate::domain::aggregates::product::SIZE_ATTRIBUTE;
use crate::domain::value_objects::ProductId;
use crate::inventory::sync::{LiveInventory, LiveRecord};
use crate::store::{InventoryStore, VariationStock};
use crate::{Result, StorefrontError};

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow { id: String, stock: i32, is_active: bool }

#[derive(Debug, sqlx::FromRow)]
struct StockRow { id: String, stock: i32 }

#[derive(Clone, Debug)]
pub struct PgInventoryStore { pool: PgPool }

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Inserts catalog variations the table does not know yet. Existing rows
    /// keep their live stock.
    pub async fn seed_from_catalog(&self, catalog: &Catalog) -> Result<u64> {
        let mut inserted = 0;
        for product in catalog.products() {
            for v in &product.variations {
                let attributes = serde_json::to_value(&v.attributes)?;
                inserted += sqlx::query(
                    "INSERT INTO product_variations (id, product_id, sku, attributes, stock, is_active, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, NOW()) ON CONFLICT (id) DO NOTHING",
                )
                .bind(&v.id).bind(product.id as i64).bind(v.sku.as_str()).bind(attributes)
                .bind(i32::try_from(v.stock).unwrap_or(i32::MAX)).bind(v.is_active)
                .execute(&self.pool).await?
                .rows_affected();
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT id, stock, is_active FROM product_variations WHERE $1::BIGINT IS NULL OR product_id = $1",
        )
        .bind(product_id.map(|id| id as i64))
        .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|r| (r.id, LiveRecord { stock: i64::from(r.stock), is_active: r.is_active })).collect())
    }

    async fn write_variation_stock(&self, variation_id: &str, new_stock: u32) -> Result<()> {
        let result = sqlx::query("UPDATE product_variations SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(variation_id).bind(i32::try_from(new_stock).unwrap_or(i32::MAX))
            .execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorefrontError::Remote(format!("no variation {variation_id}")));
        }
        Ok(())
    }

    async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>> {
        let row = sqlx::query_as::<_, StockRow>(
            "SELECT id, stock FROM product_variations WHERE product_id = $1 AND attributes ->> $2 = $3 ORDER BY sku LIMIT 1",
        )
        .bind(product_id as i64).bind(SIZE_ATTRIBUTE).bind(size)
        .fetch_optional(&self.pool).await?;
        Ok(row.map(|r| VariationStock { variation_id: r.id, stock: u32::try_from(r.stock.max(0)).unwrap_or(0) }))
    }
}
