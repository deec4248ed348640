//! Threadline Storefront - apparel storefront backend

use std::sync::Arc;
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use threadline_storefront::{
    api::{self, AppState},
    catalog::Catalog,
    checkout::CheckoutService,
    config::{Config, InventoryBackend},
    inventory::LiveCatalog,
    publisher::EventPublisher,
    recommend::Recommender,
    store::{FileStorage, InventoryStore, MemoryInventoryStore, PgInventoryStore, UnconfiguredStore},
    storefront::Storefront,
    telemetry,
};

async fn inventory_store(config: &Config, catalog: &Catalog) -> Result<Arc<dyn InventoryStore>> {
    let store: Arc<dyn InventoryStore> = match (config.inventory_backend, config.database_url.as_deref()) {
        (InventoryBackend::Postgres, Some(url)) => {
            let pool = PgPoolOptions::new().max_connections(10).connect_lazy(url)?;
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                tracing::warn!(error = %e, "Migrations not applied; inventory reads will fall back to catalog stock");
            }
            let store = PgInventoryStore::new(pool);
            match store.seed_from_catalog(catalog).await {
                Ok(seeded) => tracing::info!(seeded, "Seeded product_variations from catalog"),
                Err(e) => tracing::warn!(error = %e, "Could not seed product_variations"),
            }
            Arc::new(store)
        }
        (InventoryBackend::Postgres, None) => Arc::new(UnconfiguredStore::new("INVENTORY_BACKEND=postgres but DATABASE_URL is not set")),
        (InventoryBackend::Memory, _) => Arc::new(MemoryInventoryStore::from_catalog(catalog)),
        (InventoryBackend::None, _) => Arc::new(UnconfiguredStore::new("no inventory backend configured")),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = Config::from_env()?;

    let catalog = Arc::new(Catalog::bundled()?);
    tracing::info!(version = catalog.version(), products = catalog.products().len(), "Loaded catalog");

    let store = inventory_store(&config, &catalog).await?;
    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable; domain events will only be logged");
                None
            }
        },
        None => None,
    };
    let publisher = EventPublisher::new(nats);

    let live = Arc::new(LiveCatalog::new(catalog, store));
    live.refresh(None).await;
    let state = AppState {
        storefront: Arc::new(Storefront::new(live.clone(), config.checkout.max_quantity_per_line)),
        checkout: Arc::new(CheckoutService::new(live.clone(), config.checkout.clone(), publisher)),
        recommender: Arc::new(Recommender::new(live)),
        storage: Arc::new(FileStorage::new(&config.storage_dir)),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Threadline storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, api::router(state)).await?;
    Ok(())
}
