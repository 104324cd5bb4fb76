use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::{
    adapters::dto::{
        token_dto::TokenResponse,
        user_dto::{CredentialsRequest, DetailResponse},
    },
    application::{
        error::ApplicationError,
        repositories::UserRepository,
        services::{
            password::{hash_password, verify_password, PasswordError},
            TokenService,
        },
    },
    domain::models::user::User,
};

const MAX_USERNAME_LENGTH: usize = 64;

pub struct UserController;

fn incorrect_credentials() -> ApplicationError {
    ApplicationError::Unauthorized("The provided credentials were incorrect".to_string())
}

fn validate_username(username: &str) -> Result<(), ApplicationError> {
    if username.trim().is_empty() {
        return Err(ApplicationError::Unprocessable(
            "Username must not be empty".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ApplicationError::Unprocessable(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

impl UserController {
    /// POST /users/register
    pub async fn register(
        State(user_repo): State<Arc<dyn UserRepository>>,
        State(admin_usernames): State<Arc<Vec<String>>>,
        Json(body): Json<CredentialsRequest>,
    ) -> Result<(StatusCode, Json<DetailResponse>), ApplicationError> {
        validate_username(&body.username)?;

        let password = body.password;
        // Argon2 blocks for tens of milliseconds.
        let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?
            .map_err(|e| match e {
                PasswordError::TooShort | PasswordError::TooLong => {
                    ApplicationError::Unprocessable(e.to_string())
                }
                _ => ApplicationError::InternalError(e.to_string()),
            })?;

        let is_admin = admin_usernames.iter().any(|u| *u == body.username);
        let user = user_repo
            .create_user(User {
                username: body.username,
                hashed_password,
                hashed_token: None,
                is_admin,
            })
            .await?;

        info!("Registered user {} (admin: {})", user.username, user.is_admin);
        Ok((
            StatusCode::CREATED,
            Json(DetailResponse {
                detail: format!("User {} created", user.username),
            }),
        ))
    }

    /// POST /users/login
    ///
    /// Issuing a token replaces the stored digest, so any earlier token of the
    /// same user stops working.
    pub async fn login(
        State(user_repo): State<Arc<dyn UserRepository>>,
        State(token_service): State<Arc<TokenService>>,
        Json(body): Json<CredentialsRequest>,
    ) -> Result<Json<TokenResponse>, ApplicationError> {
        let user = user_repo
            .get_user(&body.username)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown user {}", body.username);
                incorrect_credentials()
            })?;

        let password = body.password;
        let hash = user.hashed_password.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?
            .map_err(|_| {
                warn!("Wrong password for user {}", user.username);
                incorrect_credentials()
            })?;

        let token = token_service.issue(&user.username)?;
        user_repo
            .set_token_hash(&user.username, &TokenService::hash_token(&token))
            .await?;

        info!("User {} logged in", user.username);
        Ok(Json(TokenResponse::bearer(token)))
    }
}
