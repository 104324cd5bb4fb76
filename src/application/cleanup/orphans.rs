use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    application::{
        error::ApplicationError, repositories::MetadataRepository, services::StorageService,
    },
    services::StorageError,
};

/// Deletes blobs that no metadata record refers to. Only reads the metadata store.
pub struct OrphanReconciler {
    metadata: Arc<dyn MetadataRepository>,
    storage: Arc<dyn StorageService>,
}

impl OrphanReconciler {
    pub fn new(metadata: Arc<dyn MetadataRepository>, storage: Arc<dyn StorageService>) -> Self {
        Self { metadata, storage }
    }

    /// Blob names present in storage that no record knows about, sorted.
    pub async fn find_orphans(&self) -> Result<Vec<String>, ApplicationError> {
        let known: HashSet<String> = self
            .metadata
            .list_files()
            .await?
            .into_iter()
            .map(|f| f.stored_name)
            .collect();
        let present = self.storage.list_names().await?;

        let mut orphans: Vec<String> = present.difference(&known).cloned().collect();
        orphans.sort();
        Ok(orphans)
    }

    /// Deletes every orphan, one at a time. A failure on one blob is logged and
    /// does not stop the others. Returns the names actually deleted.
    pub async fn run(&self) -> Result<Vec<String>, ApplicationError> {
        let orphans = self.find_orphans().await?;

        let mut deleted = Vec::with_capacity(orphans.len());
        for name in orphans {
            match self.storage.delete(&name).await {
                Ok(()) => deleted.push(name),
                Err(StorageError::NotFound(_)) => {
                    debug!("Orphaned blob {} disappeared before deletion", name);
                }
                Err(e) if e.is_configuration() => return Err(e.into()),
                Err(e) => warn!("Could not delete orphaned blob {}: {}", name, e),
            }
        }
        Ok(deleted)
    }
}
