//! Reconciliation between the metadata store and the blob storage.
//!
//! Two independent passes keep them consistent: [`ExpiryReconciler`] removes
//! records (and their blobs) that outlived their lifetime, [`OrphanReconciler`]
//! removes blobs that no record points at. [`CleanupScheduler`] runs both, in
//! that order, on a fixed interval.

mod expiry;
mod orphans;
mod scheduler;
mod service;

pub use expiry::{ExpiryReconciler, RemovedFile};
pub use orphans::OrphanReconciler;
pub use scheduler::{CleanupScheduler, SchedulerHandle};
pub use service::{CleanupReport, CleanupService};

#[cfg(test)]
mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};

    use crate::{
        adapters::{database::connect_in_memory, repositories::SqliteMetadataRepository},
        application::repositories::MetadataRepository,
        domain::models::file::FileRecord,
    };

    pub fn record(id: &str, stored_name: &str, lifetime: i64, upload_time: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            owner: None,
            original_name: format!("original-{}", stored_name),
            stored_name: stored_name.to_string(),
            mimetype: "image/jpeg".to_string(),
            size: 430061,
            upload_time,
            lifetime,
        }
    }

    pub async fn metadata_with(records: Vec<FileRecord>) -> Arc<dyn MetadataRepository> {
        let repo = SqliteMetadataRepository::new(connect_in_memory().await.unwrap());
        for record in records {
            repo.create_file(record).await.unwrap();
        }
        Arc::new(repo)
    }
}
