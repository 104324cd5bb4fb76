mod sqlite_metadata_repository;
mod sqlite_user_repository;

pub use sqlite_metadata_repository::{SqliteMetadataRepository, SqliteMetadataSession};
pub use sqlite_user_repository::SqliteUserRepository;
