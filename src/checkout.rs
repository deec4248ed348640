//! Checkout and order flow.
//!
//! Cash orders deduct stock synchronously and only complete when every
//! deduction write succeeded. Gateway orders are handed off to the payment
//! page; stock is deducted later, when the shopper comes back through the
//! payment-status boundary, from whatever cart is still stored for them.

use std::sync::Arc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::config::CheckoutConfig;
use crate::domain::aggregates::{Cart, CustomerDetails, LineItem, Order, PaymentMethod};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;
use crate::inventory::deduction::{deduct_stock, DeductionReport};
use crate::inventory::policy::is_in_stock;
use crate::inventory::sync::LiveCatalog;
use crate::publisher::EventPublisher;
use crate::store::ClientStore;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest { pub customer: CustomerDetails, pub payment_method: PaymentMethod }

#[derive(Debug, Serialize)]
#[serde(tag = "next", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Confirmation { order: Order, deduction: DeductionReport },
    #[serde(rename_all = "camelCase")]
    Redirect { order: Order, redirect_url: String },
}

/// Parameters the payment gateway sends the shopper back with.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReturn { pub order_id: String, pub amount: Decimal }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation { pub order_id: String, pub amount: Decimal, pub deduction: DeductionReport }

pub struct CheckoutService { live: Arc<LiveCatalog>, config: CheckoutConfig, currency: String, publisher: EventPublisher }

impl CheckoutService {
    pub fn new(live: Arc<LiveCatalog>, config: CheckoutConfig, publisher: EventPublisher) -> Self {
        let currency = live.catalog().currency().to_string();
        Self { live, config, currency, publisher }
    }

    pub fn delivery_charge(&self, subtotal: &Money) -> Money {
        match self.config.free_delivery_threshold {
            Some(threshold) if subtotal.amount() >= threshold => Money::zero(&self.currency),
            _ => Money::new(self.config.delivery_charge, &self.currency),
        }
    }

    #[tracing::instrument(skip_all, fields(session = client.session().id(), method = ?request.payment_method))]
    pub async fn submit(&self, client: &ClientStore, request: CheckoutRequest) -> Result<CheckoutOutcome> {
        request.customer.validate()?;
        let cart = client.cart().await?;
        if cart.is_empty() { return Err(StorefrontError::EmptyCart); }
        self.revalidate(&cart).await?;

        let mut order = self.build_order(&cart, request);
        order.place()?;

        if !order.payment_method().is_cash() {
            order.hand_off()?;
            self.publisher.publish_all(order.take_events()).await;
            let redirect_url = format!("{}?orderId={}&amount={}", self.config.payment_gateway_url, order.id(), order.total().amount());
            tracing::info!(order_id = order.id(), "Handing order off to payment gateway");
            return Ok(CheckoutOutcome::Redirect { order, redirect_url });
        }

        let deduction = deduct_stock(self.live.store().as_ref(), &cart.purchased_lines()).await;
        self.publisher.publish_all(deduction.events()).await;
        if deduction.has_failures() {
            order.fail(format!("{} stock update(s) failed", deduction.failed()))?;
            self.publisher.publish_all(order.take_events()).await;
            tracing::error!(order_id = order.id(), failed = deduction.failed(), "Cash order not completed; cart kept");
            return Err(StorefrontError::StockUpdateFailed { failed_lines: deduction.failed() });
        }

        // stock is already written: from here on the order completes
        order.complete()?;
        self.publisher.publish_all(order.take_events()).await;
        if let Err(e) = client.clear_cart().await {
            tracing::warn!(order_id = order.id(), error = %e, "Could not clear cart after cash order");
        }
        self.live.refresh(None).await;
        tracing::info!(order_id = order.id(), total = %order.total().amount(), "Cash order completed");
        Ok(CheckoutOutcome::Confirmation { order, deduction })
    }

    /// Return leg of a gateway payment. Payment already happened, so nothing
    /// here fails the order: deduction and cleanup problems are only logged.
    #[tracing::instrument(skip_all, fields(session = client.session().id(), order_id = %payment.order_id))]
    pub async fn complete_payment(&self, client: &ClientStore, payment: PaymentReturn) -> PaymentConfirmation {
        let cart = client.cart().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read stored cart after payment");
            Cart::default()
        });
        let deduction = deduct_stock(self.live.store().as_ref(), &cart.purchased_lines()).await;
        if deduction.has_failures() {
            tracing::warn!(failed = deduction.failed(), "Stock deduction incomplete after gateway payment");
        }
        if let Err(e) = client.clear_cart().await {
            tracing::warn!(error = %e, "Could not clear cart after payment");
        }
        let mut events = deduction.events();
        events.push(DomainEvent::Order(OrderEvent::Completed { order_id: payment.order_id.clone() }));
        self.publisher.publish_all(events).await;
        self.live.refresh(None).await;
        PaymentConfirmation { order_id: payment.order_id, amount: payment.amount, deduction }
    }

    /// Rejects carts holding a line whose variation is no longer purchasable.
    async fn revalidate(&self, cart: &Cart) -> Result<()> {
        for item in cart.items() {
            let Some(product) = self.live.product(item.product_id).await else { continue };
            if let Some(variation) = product.variations.iter().find(|v| v.sku == item.sku) {
                if !is_in_stock(variation) {
                    return Err(StorefrontError::OutOfStock { sku: item.sku.to_string() });
                }
            }
        }
        Ok(())
    }

    fn build_order(&self, cart: &Cart, request: CheckoutRequest) -> Order {
        let mut order = Order::create(request.customer, request.payment_method, &self.currency);
        for item in cart.items() {
            order.add_item(LineItem::from_cart_item(item, &self.currency));
        }
        order.set_delivery_charge(self.delivery_charge(&cart.subtotal(&self.currency)));
        order.set_discount(cart.savings(&self.currency));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::catalog::Catalog;
    use crate::domain::aggregates::product::fixtures::sized_product;
    use crate::domain::aggregates::{CartItem, OrderStatus};
    use crate::domain::value_objects::Quantity;
    use async_trait::async_trait;
    use crate::domain::value_objects::ProductId;
    use crate::inventory::sync::LiveInventory;
    use crate::store::{InventoryStore, LocalStorage, MemoryInventoryStore, MemoryStorage, SessionContext, VariationStock};

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Asha Rao".into(), email: "asha@example.com".into(), phone: "9876543210".into(),
            address: "12 MG Road".into(), city: "Pune".into(), state: "MH".into(), pincode: "411001".into(),
        }
    }

    fn cash() -> CheckoutRequest { CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Cash } }

    /// Reads from the memory store, refuses every stock write.
    struct RejectingWrites { inner: Arc<MemoryInventoryStore> }

    #[async_trait]
    impl InventoryStore for RejectingWrites {
        async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory> { self.inner.fetch_variation_inventory(product_id).await }
        async fn write_variation_stock(&self, _variation_id: &str, _new_stock: u32) -> Result<()> { Err(StorefrontError::Remote("write timeout".into())) }
        async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>> {
            self.inner.find_variation_by_product_and_size(product_id, size).await
        }
    }

    /// Local storage that cannot delete keys.
    #[derive(Default)]
    struct StuckStorage { inner: MemoryStorage }

    #[async_trait]
    impl LocalStorage for StuckStorage {
        async fn get_item(&self, key: &str) -> Result<Option<String>> { self.inner.get_item(key).await }
        async fn set_item(&self, key: &str, value: String) -> Result<()> { self.inner.set_item(key, value).await }
        async fn remove_item(&self, _key: &str) -> Result<()> { Err(StorefrontError::StorageError("disk full".into())) }
    }

    async fn setup(stock: u32) -> (CheckoutService, Arc<MemoryInventoryStore>, ClientStore) {
        build(stock, |s| s as Arc<dyn InventoryStore>, Arc::new(MemoryStorage::default())).await
    }

    async fn build(
        stock: u32,
        wrap: impl FnOnce(Arc<MemoryInventoryStore>) -> Arc<dyn InventoryStore>,
        storage: Arc<dyn LocalStorage>,
    ) -> (CheckoutService, Arc<MemoryInventoryStore>, ClientStore) {
        let catalog = Arc::new(Catalog::new(vec![sized_product(7, &[("L", stock, 2, true)])]).unwrap());
        let store = Arc::new(MemoryInventoryStore::from_catalog(&catalog));
        let live = Arc::new(LiveCatalog::new(catalog.clone(), wrap(store.clone())));
        let client = ClientStore::new(storage, SessionContext::new("buyer").unwrap());
        let product = catalog.product(7).unwrap();
        let mut cart = Cart::default();
        cart.add_item(CartItem::from_selection(product, &product.variations[0], Quantity::from(2), Utc::now()));
        client.save_cart(&cart).await.unwrap();
        (CheckoutService::new(live, CheckoutConfig::default(), EventPublisher::disabled()), store, client)
    }

    #[tokio::test]
    async fn test_cash_checkout_deducts_and_clears_cart() {
        let (checkout, store, client) = setup(5).await;
        let outcome = checkout.submit(&client, CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Cash }).await.unwrap();
        let CheckoutOutcome::Confirmation { order, deduction } = outcome else { panic!("expected confirmation") };
        assert_eq!(order.status(), &OrderStatus::Completed);
        assert_eq!(deduction.deducted(), 1);
        assert_eq!(store.stock_of("var-7-l").await, Some(3));
        assert!(client.cart().await.unwrap().is_empty());
        // 2 x 1099 is above the free delivery threshold
        assert_eq!(order.delivery_charge().amount(), Decimal::ZERO);
        assert_eq!(order.total().amount(), Decimal::new(2198, 0));
        assert_eq!(order.discount().amount(), Decimal::new(1000, 0));
    }

    #[tokio::test]
    async fn test_cash_checkout_fails_when_stock_write_fails() {
        let (checkout, store, client) = build(5, |s| Arc::new(RejectingWrites { inner: s }) as Arc<dyn InventoryStore>, Arc::new(MemoryStorage::default())).await;
        let err = checkout.submit(&client, cash()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::StockUpdateFailed { failed_lines: 1 }));
        assert_eq!(err.to_string(), "Failed to update stock, please try again");
        assert_eq!(client.cart().await.unwrap().item_count(), 1);
        assert_eq!(store.stock_of("var-7-l").await, Some(5));
    }

    #[tokio::test]
    async fn test_cash_checkout_completes_when_cart_clear_fails() {
        let (checkout, store, client) = build(5, |s| s as Arc<dyn InventoryStore>, Arc::new(StuckStorage::default())).await;
        let outcome = checkout.submit(&client, cash()).await.unwrap();
        let CheckoutOutcome::Confirmation { order, .. } = outcome else { panic!("expected confirmation") };
        assert_eq!(order.status(), &OrderStatus::Completed);
        assert_eq!(store.stock_of("var-7-l").await, Some(3));
    }

    #[tokio::test]
    async fn test_gateway_checkout_defers_deduction() {
        let (checkout, store, client) = setup(5).await;
        let outcome = checkout.submit(&client, CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Upi }).await.unwrap();
        let CheckoutOutcome::Redirect { order, redirect_url } = outcome else { panic!("expected redirect") };
        assert_eq!(order.status(), &OrderStatus::AwaitingPayment);
        assert!(redirect_url.contains(&format!("orderId={}", order.id())));
        assert_eq!(store.stock_of("var-7-l").await, Some(5));
        assert_eq!(client.cart().await.unwrap().item_count(), 1);

        let confirmation = checkout.complete_payment(&client, PaymentReturn { order_id: order.id().to_string(), amount: Decimal::new(2198, 0) }).await;
        assert_eq!(confirmation.deduction.deducted(), 1);
        assert_eq!(store.stock_of("var-7-l").await, Some(3));
        assert!(client.cart().await.unwrap().is_empty());

        // a second return finds nothing left to deduct
        let again = checkout.complete_payment(&client, PaymentReturn { order_id: order.id().to_string(), amount: Decimal::ONE }).await;
        assert!(again.deduction.lines.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let (checkout, store, client) = setup(5).await;
        let mut bad = customer();
        bad.email = "not-an-email".into();
        assert!(matches!(checkout.submit(&client, CheckoutRequest { customer: bad, payment_method: PaymentMethod::Cash }).await, Err(StorefrontError::Validation(_))));

        store.set_stock("var-7-l", 0, true).await.unwrap();
        checkout.live.refresh(Some(7)).await;
        assert!(matches!(checkout.submit(&client, CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Cash }).await, Err(StorefrontError::OutOfStock { .. })));
        assert_eq!(client.cart().await.unwrap().item_count(), 1);

        client.clear_cart().await.unwrap();
        assert!(matches!(checkout.submit(&client, CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Cash }).await, Err(StorefrontError::EmptyCart)));
    }

    #[test]
    fn test_delivery_charge_threshold() {
        let catalog = Arc::new(Catalog::new(vec![]).unwrap());
        let live = Arc::new(LiveCatalog::new(catalog.clone(), Arc::new(MemoryInventoryStore::from_catalog(&catalog))));
        let checkout = CheckoutService::new(live, CheckoutConfig::default(), EventPublisher::disabled());
        assert_eq!(checkout.delivery_charge(&Money::new(Decimal::new(500, 0), "INR")).amount(), Decimal::new(99, 0));
        assert_eq!(checkout.delivery_charge(&Money::new(Decimal::new(1999, 0), "INR")).amount(), Decimal::ZERO);
    }
}
