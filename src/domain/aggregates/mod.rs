//! Aggregates module
pub mod cart;
pub mod favorites;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem};
pub use favorites::{Favorites, ProductSnapshot, RecentlyViewed};
pub use order::{CustomerDetails, LineItem, Order, OrderError, OrderStatus, PaymentMethod};
pub use product::{AttributeMap, PriceDisplay, Product, ProductAttribute, ProductError, ProductVariation};
