use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is not configured: {0}")]
    Configuration(String),

    #[error("Storage root does not exist: {0}")]
    RootNotFound(String),

    #[error("Storage root is not a directory: {0}")]
    NotADirectory(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to delete file {name}: {reason}")]
    Deletion { name: String, reason: String },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the storage root itself is unusable, as opposed to a single blob.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StorageError::Configuration(_)
                | StorageError::RootNotFound(_)
                | StorageError::NotADirectory(_)
        )
    }
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ApplicationError::NotFound("File not found".to_string()),
            StorageError::InvalidName(name) => {
                ApplicationError::BadRequest(format!("Invalid file name: {}", name))
            }
            StorageError::Configuration(_)
            | StorageError::RootNotFound(_)
            | StorageError::NotADirectory(_) => ApplicationError::Configuration(error.to_string()),
            StorageError::Deletion { .. } | StorageError::Io(_) => {
                ApplicationError::InternalError(format!("Storage error: {}", error))
            }
        }
    }
}
