use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    application::services::StorageService,
    services::{StorageError, SENTINEL_NAME},
};

/// In-memory blob store for unit tests. Names registered with `fail_deletion_of`
/// stay in place and report a deletion failure.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    undeletable: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryStorage {
    pub fn with_blobs(names: &[&str]) -> Self {
        let storage = Self::default();
        {
            let mut blobs = storage.blobs.lock().unwrap();
            for name in names {
                blobs.insert(name.to_string(), name.as_bytes().to_vec());
            }
        }
        storage
    }

    pub fn fail_deletion_of(&self, name: &str) {
        self.undeletable.lock().unwrap().insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(name)
    }

    /// Names removed so far, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn store(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.contains(name))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        if !self.contains(name) {
            return Err(StorageError::NotFound(name.to_string()));
        }
        if self.undeletable.lock().unwrap().contains(name) {
            return Err(StorageError::Deletion {
                name: name.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        self.blobs.lock().unwrap().remove(name);
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn list_names(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|name| name.as_str() != SENTINEL_NAME)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_skips_the_sentinel() {
        let storage = MemoryStorage::with_blobs(&[SENTINEL_NAME, "abcdefgh.txt"]);

        let names = storage.list_names().await.unwrap();

        assert_eq!(names, HashSet::from(["abcdefgh.txt".to_string()]));
        assert!(storage.exists(SENTINEL_NAME).await.unwrap());
    }
}
