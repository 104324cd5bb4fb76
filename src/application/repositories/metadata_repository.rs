use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::file::FileRecord};

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn create_file(&self, record: FileRecord) -> Result<FileRecord, ApplicationError>;
    async fn get_file(&self, file_id: &str) -> Result<FileRecord, ApplicationError>;
    async fn list_files(&self) -> Result<Vec<FileRecord>, ApplicationError>;
    async fn list_files_by_owner(&self, owner: &str) -> Result<Vec<FileRecord>, ApplicationError>;
    async fn delete_file(&self, file_id: &str) -> Result<FileRecord, ApplicationError>;

    /// Opens a transaction for a batch of deletions.
    async fn begin(&self) -> Result<Box<dyn MetadataSession>, ApplicationError>;
}

/// One metadata transaction. Dropping it without `commit` rolls every change back.
#[async_trait]
pub trait MetadataSession: Send {
    /// Removes the record with `file_id`. Returns false when it was already gone.
    async fn delete_file(&mut self, file_id: &str) -> Result<bool, ApplicationError>;
    async fn commit(self: Box<Self>) -> Result<(), ApplicationError>;
}
