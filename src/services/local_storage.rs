use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::{application::services::StorageService, services::error::StorageError};

/// Environment variable holding the storage root.
pub const STORAGE_PATH_VAR: &str = "STORAGE_PATH";

/// Directory placeholder that is never reported as a stored file.
pub const SENTINEL_NAME: &str = ".gitignore";

/// Blob storage backed by a flat directory on the local filesystem.
pub struct LocalStorageService {
    configured_root: Option<PathBuf>,
}

impl LocalStorageService {
    pub fn new(configured_root: Option<PathBuf>) -> Self {
        Self { configured_root }
    }

    /// Validates the configured root. Checked again by every operation, so a root
    /// removed at runtime surfaces as a configuration error instead of per-file noise.
    pub async fn resolve_storage_root(&self) -> Result<PathBuf, StorageError> {
        let root = self.configured_root.as_ref().ok_or_else(|| {
            StorageError::Configuration(format!(
                "the environment variable '{}' is not set",
                STORAGE_PATH_VAR
            ))
        })?;

        let metadata = match fs::metadata(root).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::RootNotFound(root.display().to_string()));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(root.display().to_string()));
        }
        Ok(root.clone())
    }

    fn blob_path(root: &Path, name: &str) -> Option<PathBuf> {
        if is_valid_name(name) {
            Some(root.join(name))
        } else {
            None
        }
    }
}

/// Only bare names directly under the root are addressable.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

async fn is_regular_file(path: &Path) -> Result<bool, StorageError> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn store(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let root = self.resolve_storage_root().await?;
        let path = Self::blob_path(&root, name)
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?;

        if let Err(e) = fs::write(&path, content).await {
            if let Err(cleanup) = fs::remove_file(&path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Could not remove partial blob {}: {}", name, cleanup);
                }
            }
            return Err(StorageError::Io(e));
        }
        debug!("Stored blob {} ({} bytes)", name, content.len());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let root = self.resolve_storage_root().await?;
        let path = Self::blob_path(&root, name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        if !is_regular_file(&path).await? {
            return Err(StorageError::NotFound(name.to_string()));
        }
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let root = self.resolve_storage_root().await?;
        match Self::blob_path(&root, name) {
            Some(path) => is_regular_file(&path).await,
            None => Ok(false),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let root = self.resolve_storage_root().await?;
        let path = Self::blob_path(&root, name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        if !is_regular_file(&path).await? {
            return Err(StorageError::NotFound(name.to_string()));
        }

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => {
                return Err(StorageError::Deletion {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        // Removal is not trusted until the file is observably gone.
        match fs::try_exists(&path).await {
            Ok(false) => {
                debug!("Deleted blob {}", name);
                Ok(())
            }
            Ok(true) => Err(StorageError::Deletion {
                name: name.to_string(),
                reason: "file still present after removal".to_string(),
            }),
            Err(e) => Err(StorageError::Deletion {
                name: name.to_string(),
                reason: format!("could not confirm removal: {}", e),
            }),
        }
    }

    async fn list_names(&self) -> Result<HashSet<String>, StorageError> {
        let root = self.resolve_storage_root().await?;
        let mut entries = fs::read_dir(&root).await?;
        let mut names = HashSet::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 entry in storage: {:?}", entry.file_name());
                continue;
            };
            if name == SENTINEL_NAME {
                continue;
            }
            if is_regular_file(&entry.path()).await? {
                names.insert(name);
            }
        }
        Ok(names)
    }
}
