//! HTTP surface.

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService, PaymentConfirmation, PaymentReturn};
use crate::domain::aggregates::{AttributeMap, Cart, Favorites, OrderError, Product, RecentlyViewed};
use crate::domain::value_objects::ProductId;
use crate::recommend::{RecommendationReply, RecommendationRequest, Recommender};
use crate::store::{ClientStore, LocalStorage, SessionContext};
use crate::storefront::{ProductCard, Resolution, Storefront};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct AppState {
    pub storefront: Arc<Storefront>,
    pub checkout: Arc<CheckoutService>,
    pub recommender: Arc<Recommender>,
    pub storage: Arc<dyn LocalStorage>,
}

impl AppState {
    fn client(&self, session: String) -> Result<ClientStore> {
        Ok(ClientStore::new(self.storage.clone(), SessionContext::new(session)?))
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound(_) | Self::CartItemNotFound => StatusCode::NOT_FOUND,
            Self::OutOfStock { .. } | Self::Order(OrderError::InvalidTransition(_)) => StatusCode::CONFLICT,
            Self::NoVariationSelected | Self::InvalidQuantity | Self::EmptyCart | Self::Validation(_) | Self::Order(OrderError::NoItems) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::StockUpdateFailed { .. } | Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Catalog(_) | Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/resolve", post(resolve))
        .route("/api/v1/cart/:session", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/:line", put(update_line).delete(remove_line))
        .route("/api/v1/buy-now/:session", post(buy_now))
        .route("/api/v1/favorites/:session", get(get_favorites).post(toggle_favorite))
        .route("/api/v1/recently-viewed/:session", get(recently_viewed))
        .route("/api/v1/checkout/:session", post(checkout))
        .route("/api/v1/payment-status/:session", get(payment_status))
        .route("/api/v1/recommendations", post(recommendations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(s): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "threadline-storefront",
        "catalogVersion": s.storefront.live().catalog().version(),
    }))
}

async fn list_products(State(s): State<AppState>) -> Json<Vec<ProductCard>> { Json(s.storefront.list_products().await) }

#[derive(Debug, Deserialize)]
pub struct ViewParams { pub session: Option<String> }

async fn get_product(State(s): State<AppState>, Path(id): Path<ProductId>, Query(p): Query<ViewParams>) -> Result<Json<Product>> {
    let client = p.session.map(|session| s.client(session)).transpose()?;
    Ok(Json(s.storefront.view_product(client.as_ref(), id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub selection: AttributeMap,
}

async fn resolve(State(s): State<AppState>, Path(id): Path<ProductId>, Json(r): Json<ResolveRequest>) -> Result<Json<Resolution>> {
    Ok(Json(s.storefront.resolve(id, &r.selection).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Cart,
    pub item_count: usize,
    pub total_quantity: u32,
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub delivery_charge: Decimal,
    pub total: Decimal,
}

impl CartView {
    fn new(cart: Cart, checkout: &CheckoutService, currency: &str) -> Self {
        let subtotal = cart.subtotal(currency);
        let delivery_charge = if cart.is_empty() { Decimal::ZERO } else { checkout.delivery_charge(&subtotal).amount() };
        Self {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            savings: cart.savings(currency).amount(),
            subtotal: subtotal.amount(),
            delivery_charge,
            total: subtotal.amount() + delivery_charge,
            items: cart,
        }
    }
}

fn cart_view(s: &AppState, cart: Cart) -> Json<CartView> {
    Json(CartView::new(cart, &s.checkout, s.storefront.live().catalog().currency()))
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    let cart = s.client(session)?.cart().await?;
    Ok(cart_view(&s, cart))
}

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub selection: AttributeMap,
    #[serde(default = "one")]
    pub quantity: u32,
}

async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddToCartRequest>) -> Result<(StatusCode, Json<CartView>)> {
    let cart = s.storefront.add_to_cart(&s.client(session)?, r.product_id, &r.selection, r.quantity).await?;
    Ok((StatusCode::CREATED, cart_view(&s, cart)))
}

async fn buy_now(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddToCartRequest>) -> Result<Json<CartView>> {
    let cart = s.storefront.buy_now(&s.client(session)?, r.product_id, &r.selection, r.quantity).await?;
    Ok(cart_view(&s, cart))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    s.client(session)?.clear_cart().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest { pub quantity: u32 }

async fn update_line(State(s): State<AppState>, Path((session, line)): Path<(String, String)>, Json(r): Json<UpdateLineRequest>) -> Result<Json<CartView>> {
    let cart = s.storefront.update_cart_quantity(&s.client(session)?, &line, r.quantity).await?;
    Ok(cart_view(&s, cart))
}

async fn remove_line(State(s): State<AppState>, Path((session, line)): Path<(String, String)>) -> Result<Json<CartView>> {
    let cart = s.storefront.remove_from_cart(&s.client(session)?, &line).await?;
    Ok(cart_view(&s, cart))
}

async fn get_favorites(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<Favorites>> {
    Ok(Json(s.client(session)?.favorites().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest { pub product_id: ProductId }

#[derive(Debug, Serialize)]
pub struct FavoriteToggled { pub favorite: bool, pub items: Favorites }

async fn toggle_favorite(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<ToggleFavoriteRequest>) -> Result<Json<FavoriteToggled>> {
    let (favorite, items) = s.storefront.toggle_favorite(&s.client(session)?, r.product_id).await?;
    Ok(Json(FavoriteToggled { favorite, items }))
}

async fn recently_viewed(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<RecentlyViewed>> {
    Ok(Json(s.client(session)?.recently_viewed().await?))
}

async fn checkout(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<CheckoutRequest>) -> Result<(StatusCode, Json<CheckoutOutcome>)> {
    let outcome = s.checkout.submit(&s.client(session)?, r).await?;
    let status = match outcome {
        CheckoutOutcome::Confirmation { .. } => StatusCode::CREATED,
        CheckoutOutcome::Redirect { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, Json(outcome)))
}

async fn payment_status(State(s): State<AppState>, Path(session): Path<String>, Query(p): Query<PaymentReturn>) -> Result<Json<PaymentConfirmation>> {
    Ok(Json(s.checkout.complete_payment(&s.client(session)?, p).await))
}

async fn recommendations(State(s): State<AppState>, Json(r): Json<RecommendationRequest>) -> Json<RecommendationReply> {
    Json(s.recommender.respond(&r).await)
}
