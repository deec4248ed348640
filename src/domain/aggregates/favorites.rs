//! Favorites and recently viewed lists

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::ProductId;

pub const RECENTLY_VIEWED_LIMIT: usize = 10;

/// Lightweight product snapshot stored in the favorites and recently viewed lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub cloth_type: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discount_percentage: u8,
    pub saved_at: DateTime<Utc>,
}

impl ProductSnapshot {
    pub fn of(product: &Product, saved_at: DateTime<Utc>) -> Self {
        let shown = product.display_price(None);
        Self {
            product_id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            cloth_type: product.cloth_type.clone(),
            image: product.primary_image().map(str::to_string),
            price: shown.price,
            original_price: shown.original_price,
            discount_percentage: shown.discount_percentage,
            saved_at,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites { items: Vec<ProductSnapshot> }

impl Favorites {
    pub fn items(&self) -> &[ProductSnapshot] { &self.items }
    pub fn contains(&self, product_id: ProductId) -> bool { self.items.iter().any(|i| i.product_id == product_id) }

    /// Adds the product if absent, removes it if present. Returns whether it is now a favorite.
    pub fn toggle(&mut self, snapshot: ProductSnapshot) -> bool {
        if self.contains(snapshot.product_id) {
            self.items.retain(|i| i.product_id != snapshot.product_id);
            false
        } else {
            self.items.push(snapshot);
            true
        }
    }
}

/// Most recent first, one entry per product.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentlyViewed { items: Vec<ProductSnapshot> }

impl RecentlyViewed {
    pub fn items(&self) -> &[ProductSnapshot] { &self.items }

    pub fn record(&mut self, snapshot: ProductSnapshot) {
        self.items.retain(|i| i.product_id != snapshot.product_id);
        self.items.insert(0, snapshot);
        self.items.truncate(RECENTLY_VIEWED_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::fixtures::sized_product;

    fn snapshot(id: ProductId) -> ProductSnapshot { ProductSnapshot::of(&sized_product(id, &[("M", 1, 1, true)]), Utc::now()) }

    #[test]
    fn test_toggle_favorite() {
        let mut favs = Favorites::default();
        assert!(favs.toggle(snapshot(1)));
        assert!(favs.contains(1));
        assert!(!favs.toggle(snapshot(1)));
        assert!(favs.items().is_empty());
    }

    #[test]
    fn test_recently_viewed_dedup_and_cap() {
        let mut recent = RecentlyViewed::default();
        for id in 1..=12 { recent.record(snapshot(id)); }
        recent.record(snapshot(5));
        let ids: Vec<_> = recent.items().iter().map(|i| i.product_id).collect();
        assert_eq!(ids.len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(ids[0], 5);
        assert_eq!(ids[1], 12);
        assert_eq!(ids.iter().filter(|id| **id == 5).count(), 1);
        assert!(!ids.contains(&2));
    }
}
