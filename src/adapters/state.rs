use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    application::{
        repositories::{MetadataRepository, UserRepository},
        services::{StorageService, TokenService},
    },
    domain::config::policy::FilePolicy,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub file_policy: Arc<FilePolicy>,
    pub token_service: Arc<TokenService>,
    pub admin_usernames: Arc<Vec<String>>,
    pub user_repository: Arc<dyn UserRepository>,
    pub metadata_repository: Arc<dyn MetadataRepository>,
    pub storage_service: Arc<dyn StorageService>,
}
