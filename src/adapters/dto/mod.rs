pub mod file_dto;
pub mod metadata_dto;
pub mod token_dto;
pub mod user_dto;
