//! Shopper actions on the product pages: browsing, size selection, cart and
//! favorites.

use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use crate::domain::aggregates::{AttributeMap, Cart, CartItem, Favorites, PriceDisplay, Product, ProductSnapshot, ProductVariation};
use crate::domain::value_objects::{ProductId, Quantity};
use crate::inventory::policy::{any_in_stock, ensure_purchasable, is_in_stock, quantity_ceiling, stock_status, StockStatus};
use crate::inventory::resolver::resolve_variation;
use crate::inventory::sync::LiveCatalog;
use crate::store::ClientStore;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: PriceDisplay,
    pub in_stock: bool,
}

/// What the product page shows for the current selection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub variation: Option<ProductVariation>,
    pub stock_status: Option<StockStatus>,
    pub price: PriceDisplay,
    pub max_quantity: u32,
    pub can_purchase: bool,
}

pub struct Storefront { live: Arc<LiveCatalog>, max_quantity_per_line: u32 }

impl Storefront {
    pub fn new(live: Arc<LiveCatalog>, max_quantity_per_line: u32) -> Self { Self { live, max_quantity_per_line } }

    pub fn live(&self) -> &LiveCatalog { &self.live }

    pub async fn list_products(&self) -> Vec<ProductCard> {
        self.live.refresh(None).await;
        self.live.products().await.into_iter().map(|product| ProductCard {
            display_price: product.display_price(None),
            in_stock: any_in_stock(&product),
            product,
        }).collect()
    }

    /// Product page load: refreshes that product's stock and, for a known
    /// shopper, records the visit.
    pub async fn view_product(&self, client: Option<&ClientStore>, id: ProductId) -> Result<Product> {
        self.live.refresh(Some(id)).await;
        let product = self.live.product(id).await.ok_or(StorefrontError::ProductNotFound(id))?;
        if let Some(client) = client {
            if let Err(e) = self.record_view(client, &product).await {
                tracing::warn!(session = client.session().id(), product_id = id, error = %e, "Could not record recently viewed product");
            }
        }
        Ok(product)
    }

    async fn record_view(&self, client: &ClientStore, product: &Product) -> Result<()> {
        let mut recent = client.recently_viewed().await?;
        recent.record(ProductSnapshot::of(product, Utc::now()));
        client.save_recently_viewed(&recent).await
    }

    pub async fn resolve(&self, id: ProductId, selection: &AttributeMap) -> Result<Resolution> {
        let product = self.live.product(id).await.ok_or(StorefrontError::ProductNotFound(id))?;
        let variation = resolve_variation(&product, selection);
        Ok(Resolution {
            stock_status: variation.map(stock_status),
            price: product.display_price(variation),
            max_quantity: variation.map_or(0, |v| quantity_ceiling(v, self.max_quantity_per_line)),
            can_purchase: variation.is_some_and(is_in_stock),
            variation: variation.cloned(),
        })
    }

    /// Adds the selected variation to the shopper's cart. Out-of-stock or
    /// unresolved selections are rejected before storage is touched.
    pub async fn add_to_cart(&self, client: &ClientStore, id: ProductId, selection: &AttributeMap, quantity: u32) -> Result<Cart> {
        let product = self.live.product(id).await.ok_or(StorefrontError::ProductNotFound(id))?;
        let variation = ensure_purchasable(resolve_variation(&product, selection))?;
        if quantity == 0 || quantity > quantity_ceiling(variation, self.max_quantity_per_line) {
            return Err(StorefrontError::InvalidQuantity);
        }
        let quantity = Quantity::from(quantity);
        let mut cart = client.cart().await?;
        let line_id = cart.add_item(CartItem::from_selection(&product, variation, quantity, Utc::now())).id.clone();
        client.save_cart(&cart).await?;
        tracing::info!(session = client.session().id(), product_id = id, sku = %variation.sku, line_id = %line_id, quantity = quantity.value(), "Added to cart");
        Ok(cart)
    }

    /// Same gate as [`add_to_cart`](Self::add_to_cart); the caller continues
    /// straight to checkout.
    pub async fn buy_now(&self, client: &ClientStore, id: ProductId, selection: &AttributeMap, quantity: u32) -> Result<Cart> {
        self.add_to_cart(client, id, selection, quantity).await
    }

    /// Setting a line above its ceiling leaves the cart as it was.
    pub async fn update_cart_quantity(&self, client: &ClientStore, line_id: &str, quantity: u32) -> Result<Cart> {
        let mut cart = client.cart().await?;
        let item = cart.items().iter().find(|i| i.id == line_id).ok_or(StorefrontError::CartItemNotFound)?;
        let ceiling = match self.live.product(item.product_id).await {
            Some(product) => product.variations.iter().find(|v| v.sku == item.sku)
                .map_or(self.max_quantity_per_line, |v| quantity_ceiling(v, self.max_quantity_per_line)),
            None => self.max_quantity_per_line,
        };
        if quantity > ceiling {
            tracing::debug!(line_id, quantity, ceiling, "Quantity above ceiling; ignoring");
            return Ok(cart);
        }
        cart.update_quantity(line_id, quantity)?;
        client.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn remove_from_cart(&self, client: &ClientStore, line_id: &str) -> Result<Cart> {
        let mut cart = client.cart().await?;
        cart.remove_item(line_id)?;
        client.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Returns whether the product is a favorite after the toggle.
    pub async fn toggle_favorite(&self, client: &ClientStore, id: ProductId) -> Result<(bool, Favorites)> {
        let product = self.live.product(id).await.ok_or(StorefrontError::ProductNotFound(id))?;
        let mut favorites = client.favorites().await?;
        let added = favorites.toggle(ProductSnapshot::of(&product, Utc::now()));
        client.save_favorites(&favorites).await?;
        Ok((added, favorites))
    }
}
