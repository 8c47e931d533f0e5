use async_trait::async_trait;

use crate::error::StorageError;

/// Durable string key-value storage.
///
/// Each key's write is atomic from a reader's perspective, and a missing key
/// (`None`) is distinct from any stored value including the empty string.
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
