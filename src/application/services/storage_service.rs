use std::collections::HashSet;

use async_trait::async_trait;

use crate::services::StorageError;

/// Flat blob storage addressed by stored name.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn store(&self, name: &str, content: &[u8]) -> Result<(), StorageError>;
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// True iff a regular file called `name` sits directly under the storage root.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Fails with `NotFound` when the blob is absent, `Deletion` when removal fails
    /// or the blob is still present afterwards.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Names of all stored blobs, excluding the directory placeholder.
    async fn list_names(&self) -> Result<HashSet<String>, StorageError>;
}
