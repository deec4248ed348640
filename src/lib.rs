//! Threadline Storefront
//!
//! Backend for an apparel storefront whose products are sold per size.
//!
//! ## Features
//! - Bundled product catalog with per-variation pricing and stock
//! - Live stock overlay from the remote inventory store
//! - Variation resolution from (partial) attribute selections
//! - Stock status and purchase gating
//! - Cart, favorites and recently viewed lists per session
//! - Checkout with cash and hosted-gateway payment paths
//! - Best-effort per-line stock deduction
//! - Chatbot-style product recommendations

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod inventory;
pub mod publisher;
pub mod recommend;
pub mod store;
pub mod storefront;
pub mod telemetry;

use thiserror::Error;

pub use domain::value_objects::{ProductId, VariationId};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Please select a size")]
    NoVariationSelected,

    #[error("{sku} is out of stock")]
    OutOfStock { sku: String },

    #[error("Invalid quantity")]
    InvalidQuantity,

    #[error("Cart item not found")]
    CartItemNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid checkout details: {0}")]
    Validation(String),

    #[error("Failed to update stock, please try again")]
    StockUpdateFailed { failed_lines: usize },

    #[error("Order error: {0}")]
    Order(#[from] domain::aggregates::OrderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] domain::aggregates::ProductError),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self { Self::Remote(e.to_string()) }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self { Self::StorageError(e.to_string()) }
}

impl From<std::io::Error> for StorefrontError {
    fn from(e: std::io::Error) -> Self { Self::StorageError(e.to_string()) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
