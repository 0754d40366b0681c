//! Raw string key-value persistence.
//!
//! Backends only move strings around; JSON encoding lives in
//! [`crate::services::storage::StorageService`].

pub mod file;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppError;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Well-known keys shared by the session flags and the mock collections.
pub mod keys {
    pub const HAS_COMPLETED_ONBOARDING: &str = "hasCompletedOnboarding";
    pub const USER_TOKEN: &str = "userToken";
    pub const USER_ID: &str = "userId";
    pub const USER_EMAIL: &str = "userEmail";
    pub const TRIPS: &str = "@trip_app:trips";
    pub const ACTIVITIES: &str = "@trip_app:activities";
}

#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn remove_item(&self, key: &str) -> Result<(), AppError>;

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), AppError> {
        for key in keys {
            self.remove_item(key).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError>;
}
