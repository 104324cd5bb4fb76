pub mod password;
pub mod storage_service;
pub mod token_service;

#[cfg(test)]
pub mod memory_storage;

pub use storage_service::StorageService;
pub use token_service::TokenService;
