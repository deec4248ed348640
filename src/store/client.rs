//! Per-session cart, favorites and recently viewed persistence.

use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{Cart, Favorites, RecentlyViewed};
use crate::store::local::LocalStorage;
use crate::{Result, StorefrontError};

pub const CART_KEY: &str = "cart";
pub const FAVORITES_KEY: &str = "favorites";
pub const RECENTLY_VIEWED_KEY: &str = "recentlyViewed";

/// Identifies one shopper's storage. Passed explicitly to everything that
/// reads or writes per-shopper state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionContext { id: String }

impl SessionContext {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid { return Err(StorefrontError::Validation(format!("invalid session id {id:?}"))); }
        Ok(Self { id })
    }
    pub fn generate() -> Self { Self { id: Uuid::new_v4().to_string() } }
    pub fn id(&self) -> &str { &self.id }
}

#[derive(Clone)]
pub struct ClientStore { storage: Arc<dyn LocalStorage>, session: SessionContext }

impl ClientStore {
    pub fn new(storage: Arc<dyn LocalStorage>, session: SessionContext) -> Self { Self { storage, session } }
    pub fn session(&self) -> &SessionContext { &self.session }

    pub async fn cart(&self) -> Result<Cart> { self.load(CART_KEY).await }
    pub async fn save_cart(&self, cart: &Cart) -> Result<()> { self.save(CART_KEY, cart).await }
    pub async fn clear_cart(&self) -> Result<()> { self.storage.remove_item(&self.key(CART_KEY)).await }

    pub async fn favorites(&self) -> Result<Favorites> { self.load(FAVORITES_KEY).await }
    pub async fn save_favorites(&self, favorites: &Favorites) -> Result<()> { self.save(FAVORITES_KEY, favorites).await }

    pub async fn recently_viewed(&self) -> Result<RecentlyViewed> { self.load(RECENTLY_VIEWED_KEY).await }
    pub async fn save_recently_viewed(&self, recent: &RecentlyViewed) -> Result<()> { self.save(RECENTLY_VIEWED_KEY, recent).await }

    fn key(&self, name: &str) -> String { format!("{}.{}", self.session.id, name) }

    /// Unreadable documents count as empty; they are overwritten on the next save.
    async fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let Some(raw) = self.storage.get_item(&self.key(name)).await? else { return Ok(T::default()) };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(session = %self.session.id, key = name, error = %e, "Discarding unreadable local state");
                Ok(T::default())
            }
        }
    }

    async fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.storage.set_item(&self.key(name), serde_json::to_string(value)?).await
    }
}
