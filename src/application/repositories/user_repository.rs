use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::user::User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `BadRequest` when the username is already taken.
    async fn create_user(&self, user: User) -> Result<User, ApplicationError>;
    async fn get_user(&self, username: &str) -> Result<Option<User>, ApplicationError>;
    async fn set_token_hash(&self, username: &str, token_hash: &str) -> Result<(), ApplicationError>;
}
