use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    adapters::state::AppState,
    application::{error::ApplicationError, services::TokenService},
};

fn credentials_error() -> ApplicationError {
    ApplicationError::Unauthorized("Could not validate credentials".to_string())
}

/// Resolves `Authorization: Bearer <token>` to a user and stores it in the request
/// extensions. Only the most recently issued token of a user is accepted.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApplicationError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!("Missing or malformed Authorization header");
            ApplicationError::Unauthorized("Not authenticated".to_string())
        })?
        .to_string();

    let claims = app_state.token_service.validate(&token)?;

    let user = app_state
        .user_repository
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| {
            warn!("Token refers to unknown user {}", claims.sub);
            credentials_error()
        })?;

    if user.hashed_token.as_deref() != Some(TokenService::hash_token(&token).as_str()) {
        warn!("Superseded token presented for user {}", user.username);
        return Err(credentials_error());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
