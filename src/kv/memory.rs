use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueBackend;
use crate::error::AppError;

/// Process-local store. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), AppError> {
        let mut items = self.items.write().await;
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.items.write().await.clear();
        Ok(())
    }
}
