use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    #[serde(skip_serializing)]
    pub hashed_token: Option<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}
