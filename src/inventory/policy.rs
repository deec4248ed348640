//! Stock policy: purchasability, status classification and quantity ceiling.
//!
//! Everything here is a pure function of the variation's current fields, so
//! callers recompute after every live refresh instead of caching results.

use serde::Serialize;
use crate::domain::aggregates::{Product, ProductVariation};
use crate::{Result, StorefrontError};

pub const DEFAULT_MAX_QUANTITY_PER_LINE: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState { InStock, LowStock, OutOfStock }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorHint { Success, Warning, Danger }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus { pub status: StockState, pub message: String, pub color_hint: ColorHint }

impl StockStatus {
    fn new(status: StockState, message: impl Into<String>) -> Self {
        let color_hint = match status {
            StockState::InStock => ColorHint::Success,
            StockState::LowStock => ColorHint::Warning,
            StockState::OutOfStock => ColorHint::Danger,
        };
        Self { status, message: message.into(), color_hint }
    }
}

pub fn is_in_stock(variation: &ProductVariation) -> bool { variation.is_active && variation.stock > 0 }

pub fn stock_status(variation: &ProductVariation) -> StockStatus {
    if !variation.is_active {
        return StockStatus::new(StockState::OutOfStock, "Unavailable");
    }
    match variation.stock {
        0 => StockStatus::new(StockState::OutOfStock, "Sold Out"),
        n if n <= variation.low_stock_threshold => StockStatus::new(StockState::LowStock, format!("Only {n} left")),
        _ => StockStatus::new(StockState::InStock, "In Stock"),
    }
}

/// Highest quantity a single line may hold for this variation.
pub fn quantity_ceiling(variation: &ProductVariation, max_per_line: u32) -> u32 { variation.stock.min(max_per_line) }

/// Gate for add-to-cart and buy-now. Runs before any network call.
pub fn ensure_purchasable(resolved: Option<&ProductVariation>) -> Result<&ProductVariation> {
    let variation = resolved.ok_or(StorefrontError::NoVariationSelected)?;
    if !is_in_stock(variation) {
        return Err(StorefrontError::OutOfStock { sku: variation.sku.to_string() });
    }
    Ok(variation)
}

/// Listing badge: whether any size of the product can be bought.
pub fn any_in_stock(product: &Product) -> bool { product.variations.iter().any(is_in_stock) }
