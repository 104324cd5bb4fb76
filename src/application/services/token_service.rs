use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::application::error::ApplicationError;

/// 256 bits, hex encoded.
pub const MIN_SECRET_KEY_LENGTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issues and validates HS256 bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret_key: &str, ttl: Duration) -> Result<Self, ApplicationError> {
        if secret_key.is_empty() {
            return Err(ApplicationError::Configuration(
                "secret key is empty".to_string(),
            ));
        }
        if secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(ApplicationError::Configuration(format!(
                "secret key must be at least {} characters (256 bits hex encoded)",
                MIN_SECRET_KEY_LENGTH
            )));
        }
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| {
            ApplicationError::Configuration("token lifetime is out of range".to_string())
        })?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            ttl_secs,
        })
    }

    pub fn generate_secret_key() -> String {
        let bytes: [u8; 32] = rand::random();
        to_hex(&bytes)
    }

    pub fn issue(&self, username: &str) -> Result<String, ApplicationError> {
        if username.is_empty() {
            return Err(ApplicationError::BadRequest("username is empty".to_string()));
        }
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApplicationError::InternalError(format!("Failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, ApplicationError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApplicationError::Unauthorized("Could not validate credentials".to_string())
        })?;
        if data.claims.sub.is_empty() {
            return Err(ApplicationError::Unauthorized(
                "Token did not include a username".to_string(),
            ));
        }
        Ok(data.claims)
    }

    /// Digest stored on the user so that only the most recently issued token is accepted.
    pub fn hash_token(token: &str) -> String {
        to_hex(&Sha256::digest(token.as_bytes()))
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
