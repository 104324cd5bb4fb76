mod error;
mod local_storage;

pub use error::StorageError;
pub use local_storage::{LocalStorageService, SENTINEL_NAME, STORAGE_PATH_VAR};

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::StorageService;

/// Builds the storage accessor and checks its root before the server accepts traffic.
pub async fn create_storage_service(
    storage_path: Option<PathBuf>,
) -> Result<Arc<dyn StorageService>, StorageError> {
    let service = LocalStorageService::new(storage_path);
    let root = service.resolve_storage_root().await?;
    tracing::info!("Using storage root {}", root.display());
    Ok(Arc::new(service))
}
