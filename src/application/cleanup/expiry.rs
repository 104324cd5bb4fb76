use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    application::{
        error::ApplicationError, repositories::MetadataRepository, services::StorageService,
    },
    domain::models::file::FileRecord,
    services::StorageError,
};

/// Summary of a record removed for expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedFile {
    pub id: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    pub upload_time: DateTime<Utc>,
    pub lifetime: i64,
}

impl From<&FileRecord> for RemovedFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_name: record.original_name.clone(),
            mimetype: record.mimetype.clone(),
            size: record.size,
            upload_time: record.upload_time,
            lifetime: record.lifetime,
        }
    }
}

/// Deletes records whose age exceeds their lifetime, together with their blobs.
pub struct ExpiryReconciler {
    metadata: Arc<dyn MetadataRepository>,
    storage: Arc<dyn StorageService>,
}

impl ExpiryReconciler {
    pub fn new(metadata: Arc<dyn MetadataRepository>, storage: Arc<dyn StorageService>) -> Self {
        Self { metadata, storage }
    }

    /// One pass over every record, measuring age against `now`.
    ///
    /// Blobs are deleted first, outside any metadata transaction. Records whose
    /// blob could not be deleted stay in the store and are retried next pass. A
    /// blob that is already absent does not block removal of its record. All
    /// record deletions are committed once at the end.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<Vec<RemovedFile>, ApplicationError> {
        let files = self.metadata.list_files().await?;

        let mut to_remove: Vec<FileRecord> = Vec::new();
        for file in files.into_iter().filter(|f| f.is_expired(now)) {
            match self.storage.delete(&file.stored_name).await {
                Ok(()) => to_remove.push(file),
                Err(StorageError::NotFound(_)) => {
                    debug!(
                        "Blob {} of expired file {} was already absent",
                        file.stored_name, file.id
                    );
                    to_remove.push(file);
                }
                Err(e) if e.is_configuration() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        "Could not delete blob of expired file {}, keeping it for the next pass: {}",
                        file.id, e
                    );
                }
            }
        }

        if to_remove.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.metadata.begin().await?;
        let mut removed = Vec::with_capacity(to_remove.len());
        for file in &to_remove {
            // A concurrent user delete may have beaten us to it.
            if session.delete_file(&file.id).await? {
                removed.push(RemovedFile::from(file));
            }
        }
        session.commit().await?;

        Ok(removed)
    }
}
