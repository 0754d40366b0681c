use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::warn;

use super::KeyValueBackend;
use crate::error::AppError;

/// All entries live in a single JSON object file.
///
/// Every call reads the file; writes rewrite it whole. A file that fails to
/// parse is treated as empty and replaced on the next write.
#[derive(Clone)]
pub struct FileBackend {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !fs::try_exists(self.path()).await? {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read(self.path()).await?;
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&raw).unwrap_or_else(|err| {
            warn!(path = ?self.path(), "storage file unreadable, starting fresh: {err}");
            BTreeMap::new()
        }))
    }

    async fn save(&self, items: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec_pretty(items)?;
        fs::write(self.path(), data).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        if items.remove(key).is_some() {
            self.save(&items).await?;
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        let before = items.len();
        for key in keys {
            items.remove(*key);
        }
        if items.len() != before {
            self.save(&items).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        self.save(&BTreeMap::new()).await
    }
}
