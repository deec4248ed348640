//! Key/value storage for per-shopper state, shaped like browser local storage.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::Result;

#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: String) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// One JSON document per key under `dir`.
#[derive(Clone, Debug)]
pub struct FileStorage { dir: PathBuf }

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }
    fn path_for(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage { items: RwLock<HashMap<String, String>> }

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> { Ok(self.items.read().await.get(key).cloned()) }
    async fn set_item(&self, key: &str, value: String) -> Result<()> { self.items.write().await.insert(key.to_string(), value); Ok(()) }
    async fn remove_item(&self, key: &str) -> Result<()> { self.items.write().await.remove(key); Ok(()) }
}
