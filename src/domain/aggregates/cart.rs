//! Cart Aggregate
//!
//! Lines are snapshots taken at add time; they do not follow live stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::{Product, ProductVariation};
use crate::domain::value_objects::{Money, ProductId, Quantity, Sku};
use crate::inventory::deduction::RawPurchasedLine;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub cloth_type: String,
    pub image: Option<String>,
    pub sku: Sku,
    pub size: Option<String>,
    pub price: Decimal,
    pub original_price: Decimal,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_selection(product: &Product, variation: &ProductVariation, quantity: Quantity, added_at: DateTime<Utc>) -> Self {
        let stamp = added_at.timestamp_nanos_opt().unwrap_or_else(|| added_at.timestamp_millis());
        Self {
            id: format!("{}-{}-{}", product.id, variation.sku, stamp),
            product_id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            cloth_type: product.cloth_type.clone(),
            image: variation.image.clone().or_else(|| product.primary_image().map(str::to_string)),
            sku: variation.sku.clone(),
            size: variation.sku.size().map(str::to_string),
            price: variation.price,
            original_price: variation.original_price,
            quantity: quantity.value(),
            added_at,
        }
    }

    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
    pub fn line_savings(&self) -> Decimal {
        ((self.original_price - self.price) * Decimal::from(self.quantity)).max(Decimal::ZERO)
    }

    pub fn to_purchased_line(&self) -> RawPurchasedLine {
        RawPurchasedLine { product_id: Some(self.product_id), size: self.size.clone(), quantity: self.quantity }
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn total_quantity(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Every add is its own line, even for the same SKU.
    pub fn add_item(&mut self, mut item: CartItem) -> &CartItem {
        let base = item.id.clone();
        let mut n = 1;
        while self.items.iter().any(|i| i.id == item.id) {
            item.id = format!("{base}-{n}");
            n += 1;
        }
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 { return self.remove_item(line_id); }
        let item = self.items.iter_mut().find(|i| i.id == line_id).ok_or(StorefrontError::CartItemNotFound)?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, line_id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.id != line_id);
        if self.items.len() == before { return Err(StorefrontError::CartItemNotFound); }
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn subtotal(&self, currency: &str) -> Money {
        Money::new(self.items.iter().map(CartItem::line_total).sum(), currency)
    }

    pub fn savings(&self, currency: &str) -> Money {
        Money::new(self.items.iter().map(CartItem::line_savings).sum(), currency)
    }

    pub fn purchased_lines(&self) -> Vec<RawPurchasedLine> { self.items.iter().map(CartItem::to_purchased_line).collect() }
}
