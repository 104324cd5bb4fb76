pub mod metadata_repository;
pub mod user_repository;

pub use metadata_repository::{MetadataRepository, MetadataSession};
pub use user_repository::UserRepository;
