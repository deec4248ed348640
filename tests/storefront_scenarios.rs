//! End-to-end storefront flows against the bundled catalog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use threadline_storefront::catalog::Catalog;
use threadline_storefront::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
use threadline_storefront::config::CheckoutConfig;
use threadline_storefront::domain::aggregates::{AttributeMap, CustomerDetails, OrderStatus, PaymentMethod};
use threadline_storefront::inventory::{deduct_stock, LiveCatalog, LiveInventory, RawPurchasedLine, SelectionState, StockState};
use threadline_storefront::publisher::EventPublisher;
use threadline_storefront::store::{
    ClientStore, InventoryStore, LocalStorage, MemoryInventoryStore, MemoryStorage, SessionContext, VariationStock,
};
use threadline_storefront::storefront::Storefront;
use threadline_storefront::{ProductId, Result, StorefrontError};

struct Shop {
    catalog: Arc<Catalog>,
    store: Arc<MemoryInventoryStore>,
    storefront: Storefront,
    checkout: CheckoutService,
    client: ClientStore,
}

fn shop() -> Shop {
    let catalog = Arc::new(Catalog::bundled().unwrap());
    let store = Arc::new(MemoryInventoryStore::from_catalog(&catalog));
    let live = Arc::new(LiveCatalog::new(catalog.clone(), store.clone()));
    let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::default());
    Shop {
        catalog,
        store,
        storefront: Storefront::new(live.clone(), 10),
        checkout: CheckoutService::new(live, CheckoutConfig::default(), EventPublisher::disabled()),
        client: ClientStore::new(storage, SessionContext::new("scenario").unwrap()),
    }
}

fn size(s: &str) -> AttributeMap { [("Size".to_string(), s.to_string())].into() }

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Meera Iyer".into(),
        email: "meera@example.com".into(),
        phone: "9988776655".into(),
        address: "7 Residency Road".into(),
        city: "Bengaluru".into(),
        state: "KA".into(),
        pincode: "560025".into(),
    }
}

#[tokio::test]
async fn sold_out_size_disables_purchase() {
    let shop = shop();
    let resolution = shop.storefront.resolve(1, &size("M")).await.unwrap();
    assert_eq!(resolution.variation.as_ref().unwrap().sku.as_str(), "PRD001-M");
    assert!(!resolution.can_purchase);
    assert_eq!(resolution.stock_status.unwrap().message, "Sold Out");
    assert!(matches!(
        shop.storefront.add_to_cart(&shop.client, 1, &size("M"), 1).await,
        Err(StorefrontError::OutOfStock { .. })
    ));
    assert!(matches!(
        shop.storefront.buy_now(&shop.client, 1, &size("M"), 1).await,
        Err(StorefrontError::OutOfStock { .. })
    ));
}

#[tokio::test]
async fn low_stock_caps_the_stepper() {
    let shop = shop();
    let resolution = shop.storefront.resolve(2, &size("M")).await.unwrap();
    let status = resolution.stock_status.unwrap();
    assert_eq!(status.status, StockState::LowStock);
    assert_eq!(status.message, "Only 2 left");

    let product = shop.catalog.product(2).unwrap();
    let mut selection = SelectionState::new();
    selection.select(product, "Size", "M");
    for _ in 0..5 {
        selection.increment(product, 10);
    }
    assert_eq!(selection.quantity().value(), 2);
}

#[tokio::test]
async fn cash_checkout_deducts_and_clears_cart() {
    let shop = shop();
    assert_eq!(shop.store.stock_of("var-7-l").await, Some(5));
    shop.storefront.add_to_cart(&shop.client, 7, &size("L"), 2).await.unwrap();

    let outcome = shop
        .checkout
        .submit(&shop.client, CheckoutRequest { customer: customer(), payment_method: PaymentMethod::Cash })
        .await
        .unwrap();
    let CheckoutOutcome::Confirmation { order, deduction } = outcome else { panic!("cash checkout should confirm") };
    assert_eq!(order.status(), &OrderStatus::Completed);
    assert_eq!(deduction.deducted(), 1);
    assert_eq!(shop.store.stock_of("var-7-l").await, Some(3));
    assert!(shop.client.cart().await.unwrap().is_empty());
}

/// Serves catalog rows but can be switched to fail every fetch.
struct FlakyStore { inner: MemoryInventoryStore, down: AtomicBool }

#[async_trait]
impl InventoryStore for FlakyStore {
    async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StorefrontError::Remote("network unreachable".into()));
        }
        self.inner.fetch_variation_inventory(product_id).await
    }
    async fn write_variation_stock(&self, variation_id: &str, new_stock: u32) -> Result<()> {
        self.inner.write_variation_stock(variation_id, new_stock).await
    }
    async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>> {
        self.inner.find_variation_by_product_and_size(product_id, size).await
    }
}

#[tokio::test]
async fn listing_survives_inventory_outage() {
    let catalog = Arc::new(Catalog::bundled().unwrap());
    let store = Arc::new(FlakyStore { inner: MemoryInventoryStore::from_catalog(&catalog), down: AtomicBool::new(true) });
    let live = Arc::new(LiveCatalog::new(catalog.clone(), store.clone()));
    let storefront = Storefront::new(live, 10);

    let cards = storefront.list_products().await;
    assert_eq!(cards.len(), catalog.products().len());
    for (card, product) in cards.iter().zip(catalog.products()) {
        let live_stock: Vec<u32> = card.product.variations.iter().map(|v| v.stock).collect();
        let static_stock: Vec<u32> = product.variations.iter().map(|v| v.stock).collect();
        assert_eq!(live_stock, static_stock);
    }

    // once the store is back, a product page shows live figures
    store.inner.set_stock("var-2-m", 0, true).await.unwrap();
    store.down.store(false, Ordering::SeqCst);
    let product = storefront.view_product(None, 2).await.unwrap();
    assert_eq!(product.variation("var-2-m").unwrap().stock, 0);
}

#[tokio::test]
async fn failed_line_does_not_undo_earlier_lines() {
    let shop = shop();
    let lines = vec![
        RawPurchasedLine { product_id: Some(8), size: Some("M".into()), quantity: 3 },
        RawPurchasedLine { product_id: Some(8), size: Some("XXXL".into()), quantity: 1 },
    ];
    let report = deduct_stock(shop.store.as_ref(), &lines).await;
    assert_eq!(report.deducted(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(shop.store.stock_of("var-8-m").await, Some(17));
}
