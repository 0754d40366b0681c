use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::{
    config::StorageBackend,
    error::AppError,
    kv::{FileBackend, KeyValueBackend, MemoryBackend, SqliteBackend},
};

/// JSON view over a [`KeyValueBackend`].
///
/// Reads never fail: a backend error or an undecodable value is logged and
/// reported as absent. Writes log and propagate.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn KeyValueBackend>,
}

impl StorageService {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn open(backend: &StorageBackend) -> Result<Self, AppError> {
        let backend: Arc<dyn KeyValueBackend> = match backend {
            StorageBackend::Memory => Arc::new(MemoryBackend::new()),
            StorageBackend::File(path) => Arc::new(FileBackend::new(path.clone())),
            StorageBackend::Sqlite(url) => Arc::new(SqliteBackend::connect(url).await?),
        };
        Ok(Self::new(backend))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(key, "failed to decode stored value: {err}");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value).map_err(|err| {
            error!(key, "failed to encode value: {err}");
            AppError::from(err)
        })?;
        self.set_raw(key, &raw).await
    }

    /// Plain string entry, without JSON decoding. Empty strings read as absent.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key).await {
            Ok(Some(raw)) if !raw.is_empty() => Some(raw),
            Ok(_) => None,
            Err(err) => {
                error!(key, "failed to read from storage: {err}");
                None
            }
        }
    }

    pub async fn set_raw(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.backend.set_item(key, value).await.map_err(|err| {
            error!(key, "failed to write to storage: {err}");
            err
        })?;
        debug!(key, "stored value");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.backend.remove_item(key).await.map_err(|err| {
            error!(key, "failed to remove from storage: {err}");
            err
        })
    }

    pub async fn remove_many(&self, keys: &[&str]) -> Result<(), AppError> {
        self.backend.multi_remove(keys).await.map_err(|err| {
            error!(?keys, "failed to remove from storage: {err}");
            err
        })
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.backend.clear().await.map_err(|err| {
            error!("failed to clear storage: {err}");
            err
        })
    }
}
