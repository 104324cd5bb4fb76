use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::domain::models::user::User;

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            username: row.try_get("username")?,
            hashed_password: row.try_get("hashed_password")?,
            hashed_token: row.try_get("hashed_token")?,
            is_admin: row.try_get("is_admin")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}
