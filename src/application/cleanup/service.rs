use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::{
    cleanup::{ExpiryReconciler, OrphanReconciler, RemovedFile},
    error::ApplicationError,
    repositories::MetadataRepository,
    services::StorageService,
};

#[derive(Debug, Default, Clone)]
pub struct CleanupReport {
    pub expired: Vec<RemovedFile>,
    pub orphaned: Vec<String>,
}

/// One full cleanup pass: expiry first, then orphans.
pub struct CleanupService {
    expiry: ExpiryReconciler,
    orphans: OrphanReconciler,
}

impl CleanupService {
    pub fn new(metadata: Arc<dyn MetadataRepository>, storage: Arc<dyn StorageService>) -> Self {
        Self {
            expiry: ExpiryReconciler::new(metadata.clone(), storage.clone()),
            orphans: OrphanReconciler::new(metadata, storage),
        }
    }

    pub async fn run_pass(&self) -> Result<CleanupReport, ApplicationError> {
        info!("Commencing cleanup...");

        let expired = self.expiry.run(Utc::now()).await?;
        if expired.is_empty() {
            info!("No expired files found");
        } else {
            let names: Vec<&str> = expired.iter().map(|f| f.original_name.as_str()).collect();
            info!("Removed the following expired files: {:?}", names);
        }

        let orphaned = self.orphans.run().await?;
        if orphaned.is_empty() {
            info!("No orphaned files found");
        } else {
            info!("Removed the following orphaned files: {:?}", orphaned);
        }

        info!("Cleanup complete");
        Ok(CleanupReport { expired, orphaned })
    }
}
